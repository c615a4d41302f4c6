use pwa_core::{Event, FitParameter, FourVector};
use pwa_data::Partition;
use pwa_model::{
    breit_wigner_amplitude, Coefficient, CoherentIntensity, DecayAmplitudeTerm, LineshapeSpec,
    ModelDescription, ParticleState, TwoBodyDecay,
};

fn particle(name: &str) -> ParticleState {
    ParticleState {
        name: name.to_string(),
        spin2: 0,
        helicity2: 0,
        coherent: false,
    }
}

/// Three distinguishable momenta so the permuted subsystems have different
/// invariant masses.
fn three_body_event() -> Event {
    let p0 = FourVector::from_mass_momentum(0.14, 0.30, 0.00, 0.40);
    let p1 = FourVector::from_mass_momentum(0.14, -0.10, 0.20, -0.30);
    let p2 = FourVector::from_mass_momentum(0.14, -0.20, -0.20, -0.10);
    Event::new(vec![p0, p1, p2])
}

#[test]
fn evaluation_lists_are_summed_not_picked() {
    let mass = 1.0;
    let width = 0.1;
    let model = ModelDescription {
        final_state_size: 3,
        particles: vec![
            particle("mother"),
            particle("d1"),
            particle("d2"),
        ],
        terms: vec![DecayAmplitudeTerm {
            name: "reso".to_string(),
            coefficient: Coefficient {
                magnitude: FitParameter::free("reso_mag", 1.0),
                phase: FitParameter::free("reso_phase", 0.0),
            },
            chain: vec![TwoBodyDecay {
                mother: 0,
                daughters: (1, 2),
                l2: 0,
                s2: 0,
                subsystem_slots: vec![0, 1],
                child_slots: vec![0],
                lineshape: LineshapeSpec::RelativisticBreitWigner {
                    mass: FitParameter::free("reso_mass", mass),
                    width: FitParameter::free("reso_width", width),
                },
            }],
            // identity plus the 0<->2 swap: the subsystem becomes {1,2}
            evaluation_lists: vec![vec![0, 1, 2], vec![2, 1, 0]],
            parity_factor: 1.0,
        }],
        background: None,
    };

    let event = three_body_event();
    let mut intensity = CoherentIntensity::new(&model).unwrap();
    intensity.set_data(std::slice::from_ref(&event)).unwrap();
    let values = intensity.evaluate_batch(Partition::DATA).unwrap();

    let s01 = (event.momenta[0] + event.momenta[1]).mass_sq();
    let s12 = (event.momenta[1] + event.momenta[2]).mass_sq();
    let a = breit_wigner_amplitude(s01, mass, width);
    let b = breit_wigner_amplitude(s12, mass, width);
    let expected = (a + b).norm_sqr();
    assert!((values[0] - expected).abs() < 1e-12 * expected.abs().max(1.0));

    // and specifically not a single-combination value
    assert!((values[0] - a.norm_sqr()).abs() > 1e-6);
    assert!((values[0] - b.norm_sqr()).abs() > 1e-6);
}

#[test]
fn parity_factor_scales_the_combinatorial_sum() {
    let make = |parity: f64| ModelDescription {
        final_state_size: 2,
        particles: vec![particle("mother"), particle("d1"), particle("d2")],
        terms: vec![DecayAmplitudeTerm {
            name: "reso".to_string(),
            coefficient: Coefficient {
                magnitude: FitParameter::free("reso_mag", 1.0),
                phase: FitParameter::free("reso_phase", 0.0),
            },
            chain: vec![TwoBodyDecay {
                mother: 0,
                daughters: (1, 2),
                l2: 0,
                s2: 0,
                subsystem_slots: vec![0, 1],
                child_slots: vec![0],
                lineshape: LineshapeSpec::NonResonant,
            }],
            evaluation_lists: vec![vec![0, 1]],
            parity_factor: parity,
        }],
        background: None,
    };
    let events = vec![Event::new(vec![
        FourVector::from_mass_momentum(0.5, 0.1, 0.0, 0.4),
        FourVector::from_mass_momentum(0.7, -0.1, 0.0, -0.4),
    ])];

    let mut plain = CoherentIntensity::new(&make(1.0)).unwrap();
    plain.set_data(&events).unwrap();
    let mut scaled = CoherentIntensity::new(&make(-2.0)).unwrap();
    scaled.set_data(&events).unwrap();

    let base = plain.evaluate_batch(Partition::DATA).unwrap()[0];
    let value = scaled.evaluate_batch(Partition::DATA).unwrap()[0];
    assert!((value - 4.0 * base).abs() < 1e-12);
}
