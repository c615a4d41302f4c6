//! Four-vectors and kinematic events.

use serde::{Deserialize, Serialize};

/// A four-momentum in the (E, px, py, pz) convention with metric (+,-,-,-).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourVector {
    /// Energy component.
    pub e: f64,
    /// Momentum x component.
    pub px: f64,
    /// Momentum y component.
    pub py: f64,
    /// Momentum z component.
    pub pz: f64,
}

impl FourVector {
    /// Creates a four-vector from its components.
    pub fn new(e: f64, px: f64, py: f64, pz: f64) -> Self {
        Self { e, px, py, pz }
    }

    /// Builds the four-vector of a particle at rest.
    pub fn at_rest(mass: f64) -> Self {
        Self::new(mass, 0.0, 0.0, 0.0)
    }

    /// Builds a four-vector from a mass and a three-momentum.
    pub fn from_mass_momentum(mass: f64, px: f64, py: f64, pz: f64) -> Self {
        let e = (mass * mass + px * px + py * py + pz * pz).sqrt();
        Self::new(e, px, py, pz)
    }

    /// Squared magnitude of the three-momentum.
    pub fn momentum_sq(&self) -> f64 {
        self.px * self.px + self.py * self.py + self.pz * self.pz
    }

    /// Magnitude of the three-momentum.
    pub fn momentum(&self) -> f64 {
        self.momentum_sq().sqrt()
    }

    /// Invariant mass squared. Can be slightly negative for massless
    /// particles due to rounding; callers clamp where it matters.
    pub fn mass_sq(&self) -> f64 {
        self.e * self.e - self.momentum_sq()
    }

    /// Invariant mass (zero for negative squared masses from rounding).
    pub fn mass(&self) -> f64 {
        self.mass_sq().max(0.0).sqrt()
    }

    /// Cosine of the polar angle of the three-momentum.
    pub fn cos_theta(&self) -> f64 {
        let p = self.momentum();
        if p == 0.0 {
            1.0
        } else {
            (self.pz / p).clamp(-1.0, 1.0)
        }
    }

    /// Azimuthal angle of the three-momentum in (-pi, pi].
    pub fn phi(&self) -> f64 {
        if self.px == 0.0 && self.py == 0.0 {
            0.0
        } else {
            self.py.atan2(self.px)
        }
    }

    /// Velocity vector that boosts this four-vector to its rest frame.
    pub fn boost_to_rest(&self) -> (f64, f64, f64) {
        (-self.px / self.e, -self.py / self.e, -self.pz / self.e)
    }

    /// Applies a Lorentz boost with velocity `(bx, by, bz)`.
    pub fn boosted(&self, bx: f64, by: f64, bz: f64) -> FourVector {
        let b2 = bx * bx + by * by + bz * bz;
        if b2 == 0.0 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let bp = bx * self.px + by * self.py + bz * self.pz;
        let gamma2 = (gamma - 1.0) / b2;
        FourVector {
            e: gamma * (self.e + bp),
            px: self.px + gamma2 * bp * bx + gamma * bx * self.e,
            py: self.py + gamma2 * bp * by + gamma * by * self.e,
            pz: self.pz + gamma2 * bp * bz + gamma * bz * self.e,
        }
    }
}

impl std::ops::Add for FourVector {
    type Output = FourVector;

    fn add(self, rhs: FourVector) -> FourVector {
        FourVector {
            e: self.e + rhs.e,
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
        }
    }
}

impl std::iter::Sum for FourVector {
    fn sum<I: Iterator<Item = FourVector>>(iter: I) -> FourVector {
        iter.fold(FourVector::default(), |acc, v| acc + v)
    }
}

/// One kinematic event: the final-state four-momenta in a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Generator weight carried through hit-and-miss sampling.
    pub weight: f64,
    /// Final-state four-momenta; index = final-state particle slot.
    pub momenta: Vec<FourVector>,
}

impl Event {
    /// Creates an event with unit weight.
    pub fn new(momenta: Vec<FourVector>) -> Self {
        Self {
            weight: 1.0,
            momenta,
        }
    }

    /// Number of final-state particles.
    pub fn len(&self) -> usize {
        self.momenta.len()
    }

    /// Returns whether the event holds no particles.
    pub fn is_empty(&self) -> bool {
        self.momenta.is_empty()
    }

    /// Summed four-momentum of the final-state slots in `indices`.
    ///
    /// Out-of-range indices are the caller's bug; the event store validates
    /// subsystems against a sample event before any batch is accepted.
    pub fn subsystem_momentum(&self, indices: &[u16]) -> FourVector {
        indices
            .iter()
            .map(|&idx| self.momenta[idx as usize])
            .sum()
    }
}
