use pwa_core::{Event, FitParameter, FourVector};
use pwa_data::Partition;
use pwa_model::{
    angular_amplitude, Coefficient, CoherentIntensity, DecayAmplitudeTerm, LineshapeSpec,
    ModelDescription, ParticleState, TwoBodyDecay,
};

fn scalar_particle(name: &str) -> ParticleState {
    ParticleState {
        name: name.to_string(),
        spin2: 0,
        helicity2: 0,
        coherent: false,
    }
}

fn unit_coefficient(stem: &str) -> Coefficient {
    Coefficient {
        magnitude: FitParameter::free(format!("{stem}_mag"), 1.0),
        phase: FitParameter::free(format!("{stem}_phase"), 0.0),
    }
}

fn back_to_back_event(px: f64, py: f64, pz: f64) -> Event {
    Event::new(vec![
        FourVector::from_mass_momentum(0.5, px, py, pz),
        FourVector::from_mass_momentum(0.7, -px, -py, -pz),
    ])
}

fn single_term_model(particles: Vec<ParticleState>) -> ModelDescription {
    ModelDescription {
        final_state_size: 2,
        particles,
        terms: vec![DecayAmplitudeTerm {
            name: "reso".to_string(),
            coefficient: unit_coefficient("reso"),
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
            parity_factor: 1.0,
        }],
        background: None,
    }
}

#[test]
fn scalar_decay_has_unit_intensity() {
    let model = single_term_model(vec![
        scalar_particle("mother"),
        scalar_particle("d1"),
        scalar_particle("d2"),
    ]);
    let mut intensity = CoherentIntensity::new(&model).unwrap();
    let events = vec![
        back_to_back_event(0.1, 0.0, 0.4),
        back_to_back_event(0.0, 0.3, -0.2),
        back_to_back_event(0.2, -0.1, 0.0),
    ];
    intensity.set_data(&events).unwrap();
    let values = intensity.evaluate_batch(Partition::DATA).unwrap();
    assert_eq!(values.len(), events.len());
    for value in values {
        assert!((value - 1.0).abs() < 1e-12);
    }
}

#[test]
fn vector_decay_follows_the_angular_distribution() {
    // J=1, M=0, lambda=0 mother: intensity = cos^2(theta)
    let mut particles = vec![
        scalar_particle("mother"),
        scalar_particle("d1"),
        scalar_particle("d2"),
    ];
    particles[0].spin2 = 2;
    let model = single_term_model(particles);

    let mut intensity = CoherentIntensity::new(&model).unwrap();
    let events = vec![
        back_to_back_event(0.1, 0.0, 0.4),
        back_to_back_event(0.3, 0.1, -0.2),
    ];
    intensity.set_data(&events).unwrap();
    let values = intensity.evaluate_batch(Partition::DATA).unwrap();
    for (value, event) in values.iter().zip(events.iter()) {
        // the pair is back to back, so the subsystem is at rest and the
        // helicity angles are the lab angles of the first daughter
        let cos_theta = event.momenta[0].cos_theta();
        let phi = event.momenta[0].phi();
        let expected = angular_amplitude(2, 0, 0, cos_theta, phi).norm_sqr();
        assert!((value - expected).abs() < 1e-12);
        assert!((value - cos_theta * cos_theta).abs() < 1e-12);
    }
}

#[test]
fn single_point_evaluation_matches_the_batch() {
    let model = single_term_model(vec![
        scalar_particle("mother"),
        scalar_particle("d1"),
        scalar_particle("d2"),
    ]);
    let mut intensity = CoherentIntensity::new(&model).unwrap();
    let events = vec![back_to_back_event(0.1, 0.0, 0.4), back_to_back_event(0.0, 0.3, -0.2)];
    intensity.set_data(&events).unwrap();
    let batch = intensity.evaluate_batch(Partition::DATA).unwrap();
    for (event, expected) in events.iter().zip(batch.iter()) {
        let point = intensity.evaluate_point(event).unwrap();
        assert!((point - expected).abs() < 1e-12);
    }
}
