use pwa_core::{Event, FitParameter, FourVector};
use pwa_data::Partition;
use pwa_model::{
    Coefficient, CoherentIntensity, DecayAmplitudeTerm, LineshapeSpec, ModelDescription,
    ParticleState, TwoBodyDecay,
};

fn particle(name: &str, coherent: bool) -> ParticleState {
    ParticleState {
        name: name.to_string(),
        spin2: 0,
        helicity2: 0,
        coherent,
    }
}

fn unit_coefficient(stem: &str) -> Coefficient {
    Coefficient {
        magnitude: FitParameter::free(format!("{stem}_mag"), 1.0),
        phase: FitParameter::free(format!("{stem}_phase"), 0.0),
    }
}

fn term(name: &str, mother: u32) -> DecayAmplitudeTerm {
    DecayAmplitudeTerm {
        name: name.to_string(),
        coefficient: unit_coefficient(name),
        chain: vec![TwoBodyDecay {
            mother,
            daughters: (1, 2),
            l2: 0,
            s2: 0,
            subsystem_slots: vec![0, 1],
            child_slots: vec![0],
            lineshape: LineshapeSpec::NonResonant,
        }],
        evaluation_lists: vec![vec![0, 1]],
        parity_factor: 1.0,
    }
}

fn events() -> Vec<Event> {
    vec![Event::new(vec![
        FourVector::from_mass_momentum(0.5, 0.1, 0.0, 0.4),
        FourVector::from_mass_momentum(0.7, -0.1, 0.0, -0.4),
    ])]
}

#[test]
fn identical_terms_in_one_group_interfere() {
    // both terms reference the same particles: equal incoherent sets, one
    // group, |1 + 1|^2 = 4
    let model = ModelDescription {
        final_state_size: 2,
        particles: vec![
            particle("mother", false),
            particle("d1", false),
            particle("d2", false),
        ],
        terms: vec![term("one", 0), term("two", 0)],
        background: None,
    };
    let mut intensity = CoherentIntensity::new(&model).unwrap();
    intensity.set_data(&events()).unwrap();
    let values = intensity.evaluate_batch(Partition::DATA).unwrap();
    assert!((values[0] - 4.0).abs() < 1e-12);
}

#[test]
fn distinct_incoherent_sets_add_probabilities() {
    // the second term decays through a different (incoherent) mother:
    // two groups, |1|^2 + |1|^2 = 2
    let model = ModelDescription {
        final_state_size: 2,
        particles: vec![
            particle("mother_a", false),
            particle("d1", false),
            particle("d2", false),
            particle("mother_b", false),
        ],
        terms: vec![term("one", 0), term("two", 3)],
        background: None,
    };
    let mut intensity = CoherentIntensity::new(&model).unwrap();
    intensity.set_data(&events()).unwrap();
    let values = intensity.evaluate_batch(Partition::DATA).unwrap();
    assert!((values[0] - 2.0).abs() < 1e-12);
}

#[test]
fn coherent_particles_are_ignored_by_the_grouping() {
    // the mothers differ but both are intrinsically coherent, so the
    // incoherent sets are equal and the terms interfere
    let model = ModelDescription {
        final_state_size: 2,
        particles: vec![
            particle("mother_a", true),
            particle("d1", false),
            particle("d2", false),
            particle("mother_b", true),
        ],
        terms: vec![term("one", 0), term("two", 3)],
        background: None,
    };
    let mut intensity = CoherentIntensity::new(&model).unwrap();
    intensity.set_data(&events()).unwrap();
    let values = intensity.evaluate_batch(Partition::DATA).unwrap();
    assert!((values[0] - 4.0).abs() < 1e-12);
}

#[test]
fn background_joins_every_group_before_squaring() {
    // one term with amplitude 1 plus a coherent background of magnitude 2:
    // |1 + 2|^2 = 9
    let model = ModelDescription {
        final_state_size: 2,
        particles: vec![
            particle("mother", false),
            particle("d1", false),
            particle("d2", false),
        ],
        terms: vec![term("one", 0)],
        background: Some(pwa_model::BackgroundSpec {
            magnitude: FitParameter::free("bg_mag", 2.0),
            phase: FitParameter::free("bg_phase", 0.0),
        }),
    };
    let mut intensity = CoherentIntensity::new(&model).unwrap();
    intensity.set_data(&events()).unwrap();
    let values = intensity.evaluate_batch(Partition::DATA).unwrap();
    assert!((values[0] - 9.0).abs() < 1e-12);
}
