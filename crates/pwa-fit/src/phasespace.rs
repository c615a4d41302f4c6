//! N-body phase-space event generation (Raubold-Lynch).

use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_core::{Event, FourVector, RngHandle};

/// Source of candidate events for hit-and-miss generation.
///
/// Implementations own their RNG state; `reset` must reproduce the candidate
/// stream exactly, which the generation loop relies on when it raises its
/// intensity bound and restarts.
pub trait PhaseSpaceSampler {
    /// Generates the next candidate event in the mother rest frame.
    fn generate(&mut self) -> Event;

    /// Resets the sampler to the given seed.
    fn reset(&mut self, seed: u64);

    /// The seed the sampler was last reset or created with.
    fn seed(&self) -> u64;
}

/// Two-body decay momentum of a mother with mass `m` into daughters `m1`,
/// `m2`; zero below threshold.
fn two_body_momentum(m: f64, m1: f64, m2: f64) -> f64 {
    let a = m * m - (m1 + m2) * (m1 + m2);
    let b = m * m - (m1 - m2) * (m1 - m2);
    if a <= 0.0 || m <= 0.0 {
        return 0.0;
    }
    (a * b).sqrt() / (2.0 * m)
}

/// Uniform phase-space sampler for an N-body decay at rest.
///
/// Implements the Raubold-Lynch algorithm: intermediate invariant masses are
/// drawn from sorted uniforms, the configuration weight is the product of the
/// sequential two-body momenta, and configurations are accepted against the
/// exact maximum weight. Accepted configurations are realized as a chain of
/// isotropic two-body decays with the accumulated system boosted at each
/// step.
#[derive(Debug, Clone)]
pub struct NBodySampler {
    mother_mass: f64,
    masses: Vec<f64>,
    kinetic_energy: f64,
    weight_max: f64,
    seed: u64,
    rng: RngHandle,
}

impl NBodySampler {
    /// Creates a sampler for `mother_mass -> masses` with the given seed.
    pub fn new(mother_mass: f64, masses: Vec<f64>, seed: u64) -> Result<Self, PwaError> {
        if masses.len() < 2 {
            return Err(PwaError::Generator(
                ErrorInfo::new("invalid-decay", "phase space needs at least two bodies")
                    .with_context("bodies", masses.len().to_string()),
            ));
        }
        let mass_sum: f64 = masses.iter().sum();
        let kinetic_energy = mother_mass - mass_sum;
        if kinetic_energy <= 0.0 {
            return Err(PwaError::Generator(
                ErrorInfo::new("invalid-decay", "decay is below threshold")
                    .with_context("mother", mother_mass.to_string())
                    .with_context("mass_sum", mass_sum.to_string()),
            ));
        }
        // Exact maximum weight: every intermediate mass at its upper edge.
        let mut weight_max = 1.0;
        let mut e_min = 0.0;
        let mut e_max = kinetic_energy + masses[0];
        for n in 1..masses.len() {
            e_min += masses[n - 1];
            e_max += masses[n];
            weight_max *= two_body_momentum(e_max, e_min, masses[n]);
        }
        Ok(Self {
            mother_mass,
            masses,
            kinetic_energy,
            weight_max,
            seed,
            rng: RngHandle::from_seed(seed),
        })
    }

    /// Mass of the decaying mother.
    pub fn mother_mass(&self) -> f64 {
        self.mother_mass
    }

    fn configuration(&mut self) -> (Vec<f64>, f64) {
        let n = self.masses.len();
        // Sorted uniforms spread the kinetic energy over the intermediate
        // systems.
        let mut fractions = vec![0.0; n];
        fractions[n - 1] = 1.0;
        for slot in fractions.iter_mut().take(n - 1).skip(1) {
            *slot = self.rng.uniform(0.0, 1.0);
        }
        fractions[1..n].sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut invariants = vec![0.0; n];
        let mut cumulative = 0.0;
        for idx in 0..n {
            cumulative += self.masses[idx];
            invariants[idx] = cumulative + fractions[idx] * self.kinetic_energy;
        }
        let mut weight = 1.0;
        for idx in 1..n {
            weight *= two_body_momentum(invariants[idx], invariants[idx - 1], self.masses[idx]);
        }
        (invariants, weight)
    }
}

impl PhaseSpaceSampler for NBodySampler {
    fn generate(&mut self) -> Event {
        let invariants = loop {
            let (invariants, weight) = self.configuration();
            if self.rng.uniform(0.0, self.weight_max) < weight {
                break invariants;
            }
        };
        let n = self.masses.len();
        let mut momenta = vec![FourVector::at_rest(self.masses[0])];
        for idx in 1..n {
            let momentum =
                two_body_momentum(invariants[idx], invariants[idx - 1], self.masses[idx]);
            let cos_theta = self.rng.uniform(-1.0, 1.0);
            let phi = self.rng.uniform(0.0, std::f64::consts::TAU);
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
            let (dx, dy, dz) = (
                sin_theta * phi.cos(),
                sin_theta * phi.sin(),
                cos_theta,
            );
            let cluster = FourVector::from_mass_momentum(
                invariants[idx - 1],
                momentum * dx,
                momentum * dy,
                momentum * dz,
            );
            let particle = FourVector::from_mass_momentum(
                self.masses[idx],
                -momentum * dx,
                -momentum * dy,
                -momentum * dz,
            );
            let (bx, by, bz) = (
                cluster.px / cluster.e,
                cluster.py / cluster.e,
                cluster.pz / cluster.e,
            );
            for built in momenta.iter_mut() {
                *built = built.boosted(bx, by, bz);
            }
            momenta.push(particle);
        }
        Event::new(momenta)
    }

    fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = RngHandle::from_seed(seed);
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
