use pwa_core::{Event, FitParameter, FourVector};
use pwa_data::Partition;
use pwa_model::{
    Coefficient, CoherentIntensity, DecayAmplitudeTerm, LineshapeSpec, ModelDescription,
    ParticleState, TwoBodyDecay,
};

fn model() -> ModelDescription {
    let particle = |name: &str| ParticleState {
        name: name.to_string(),
        spin2: 0,
        helicity2: 0,
        coherent: false,
    };
    ModelDescription {
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
                lineshape: LineshapeSpec::RelativisticBreitWigner {
                    mass: FitParameter::free("reso_mass", 1.0),
                    width: FitParameter::free("reso_width", 0.1),
                },
            }],
            evaluation_lists: vec![vec![0, 1]],
            parity_factor: 1.0,
        }],
        background: None,
    }
}

fn events() -> Vec<Event> {
    vec![
        Event::new(vec![
            FourVector::from_mass_momentum(0.5, 0.1, 0.0, 0.4),
            FourVector::from_mass_momentum(0.7, -0.1, 0.0, -0.4),
        ]),
        Event::new(vec![
            FourVector::from_mass_momentum(0.5, 0.0, 0.2, -0.3),
            FourVector::from_mass_momentum(0.7, 0.0, -0.2, 0.3),
        ]),
    ]
}

#[test]
fn non_finite_intensity_is_clamped_to_zero() {
    let mut intensity = CoherentIntensity::new(&model()).unwrap();
    intensity.set_data(&events()).unwrap();

    let healthy = intensity.evaluate_batch(Partition::DATA).unwrap();
    assert!(healthy.iter().all(|value| value.is_finite() && *value > 0.0));
    assert_eq!(intensity.invalid_event_count(), 0);

    // a NaN shape parameter poisons every event of the batch
    intensity.update_parameters(&[("reso_mass".to_string(), f64::NAN)]);
    let clamped = intensity.evaluate_batch(Partition::DATA).unwrap();
    assert_eq!(clamped, vec![0.0, 0.0]);
    assert_eq!(intensity.invalid_event_count(), 2);

    // recovery: a later evaluation with sane parameters is unaffected
    intensity.update_parameters(&[("reso_mass".to_string(), 1.0)]);
    let recovered = intensity.evaluate_batch(Partition::DATA).unwrap();
    for (value, reference) in recovered.iter().zip(healthy.iter()) {
        assert!((value - reference).abs() < 1e-12);
    }
    assert_eq!(intensity.invalid_event_count(), 2);
}
