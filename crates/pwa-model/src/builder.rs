//! Construction of the coherent/incoherent amplitude graph.

use std::collections::{BTreeMap, BTreeSet};

use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_core::ParameterSet;
use pwa_data::{KinVariable, Partition, Subsystem};
use pwa_graph::{
    AbsSquare, AddAll, Complexify, Graph, LeafBinding, MultAll, Value, ValueKind,
};

use crate::angular::HelicityAngular;
use crate::dynamics::{Flatte, NonResonant, RelativisticBreitWigner};
use crate::topology::{DecayAmplitudeTerm, LineshapeSpec, ModelDescription};

/// A fully linked per-partition amplitude graph plus the kinematic variables
/// its column leaves read. The caller lays out the matching store partition
/// with exactly these variables.
#[derive(Debug)]
pub struct AmplitudeGraph {
    /// The resolved computation graph; head is the total-intensity node.
    pub graph: Graph,
    /// Variables required by the graph's column leaves.
    pub variables: Vec<KinVariable>,
}

/// Builds amplitude graphs from a decay-topology description.
pub struct AmplitudeBuilder<'a> {
    description: &'a ModelDescription,
}

fn invalid(message: &str, term: &str) -> PwaError {
    PwaError::Model(
        ErrorInfo::new("invalid-topology", message).with_context("term", term),
    )
}

impl<'a> AmplitudeBuilder<'a> {
    /// Creates a builder over the given description.
    pub fn new(description: &'a ModelDescription) -> Self {
        Self { description }
    }

    /// Validates the description independent of any partition.
    pub fn validate(&self) -> Result<(), PwaError> {
        let fs = self.description.final_state_size;
        if fs == 0 {
            return Err(invalid("final state is empty", "-"));
        }
        let mut seen_names = BTreeSet::new();
        for term in &self.description.terms {
            if !seen_names.insert(term.name.as_str()) {
                return Err(invalid("duplicate term name", &term.name));
            }
            if term.chain.is_empty() {
                return Err(invalid("term has an empty decay chain", &term.name));
            }
            if term.evaluation_lists.is_empty() {
                return Err(invalid("term has no evaluation lists", &term.name));
            }
            for list in &term.evaluation_lists {
                let mut sorted = list.clone();
                sorted.sort_unstable();
                let is_permutation = sorted.len() == fs as usize
                    && sorted.iter().enumerate().all(|(idx, &slot)| slot == idx as u16);
                if !is_permutation {
                    return Err(invalid(
                        "evaluation list is not a final-state permutation",
                        &term.name,
                    ));
                }
            }
            for decay in &term.chain {
                let particles = self.description.particles.len() as u32;
                if decay.mother >= particles
                    || decay.daughters.0 >= particles
                    || decay.daughters.1 >= particles
                {
                    return Err(invalid("decay references an unknown particle", &term.name));
                }
                if decay.subsystem_slots.is_empty()
                    || decay.subsystem_slots.iter().any(|&slot| slot >= fs)
                {
                    return Err(invalid("decay subsystem slots are out of range", &term.name));
                }
                if decay.child_slots.is_empty()
                    || decay
                        .child_slots
                        .iter()
                        .any(|slot| !decay.subsystem_slots.contains(slot))
                {
                    return Err(invalid(
                        "decay child slots must be a non-empty subset of the subsystem",
                        &term.name,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Registers every fit parameter the description names.
    pub fn declare_parameters(&self, parameters: &mut ParameterSet) {
        for term in &self.description.terms {
            parameters.declare(term.coefficient.magnitude.clone());
            parameters.declare(term.coefficient.phase.clone());
            for decay in &term.chain {
                match &decay.lineshape {
                    LineshapeSpec::NonResonant => {}
                    LineshapeSpec::RelativisticBreitWigner { mass, width } => {
                        parameters.declare(mass.clone());
                        parameters.declare(width.clone());
                    }
                    LineshapeSpec::Flatte { mass, g1, g2, .. } => {
                        parameters.declare(mass.clone());
                        parameters.declare(g1.clone());
                        parameters.declare(g2.clone());
                    }
                }
            }
        }
        if let Some(background) = &self.description.background {
            parameters.declare(background.magnitude.clone());
            parameters.declare(background.phase.clone());
        }
    }

    /// The incoherent particle-index set deciding the term's coherency group.
    fn incoherent_set(&self, term: &DecayAmplitudeTerm) -> BTreeSet<u32> {
        let mut set = BTreeSet::new();
        for decay in &term.chain {
            for index in [decay.mother, decay.daughters.0, decay.daughters.1] {
                if !self.description.particles[index as usize].coherent {
                    set.insert(index);
                }
            }
        }
        set
    }

    fn add_parameter_leaf(
        graph: &mut Graph,
        parameter_name: &str,
        parent: &str,
    ) -> Result<(), PwaError> {
        graph.add_leaf(
            format!("p_{parameter_name}"),
            LeafBinding::Parameter(parameter_name.to_string()),
            parent,
        )?;
        Ok(())
    }

    fn add_column_leaf(
        graph: &mut Graph,
        partition: Partition,
        variable: &KinVariable,
        parent: &str,
    ) -> Result<(), PwaError> {
        graph.add_leaf(
            format!("v_{}", variable.label()),
            LeafBinding::Column {
                partition,
                variable: variable.clone(),
            },
            parent,
        )?;
        Ok(())
    }

    /// Builds the intensity graph for one store partition.
    ///
    /// Data and phase-space graphs are constructed independently: they read
    /// different partitions and carry independent caches, so they may be
    /// evaluated concurrently from separate owners.
    pub fn build(&self, partition: Partition) -> Result<AmplitudeGraph, PwaError> {
        self.validate()?;
        let mut graph = Graph::new();
        let mut variables: BTreeSet<KinVariable> = BTreeSet::new();
        let mut term_nodes: Vec<(BTreeSet<u32>, String)> = Vec::new();

        for term in &self.description.terms {
            let coefficient_name = format!("{}_coefficient", term.name);
            graph.add_node(
                coefficient_name.as_str(),
                ValueKind::ComplexScalar,
                Box::new(Complexify::new(ValueKind::ComplexScalar)),
            )?;
            Self::add_parameter_leaf(
                &mut graph,
                &term.coefficient.magnitude.name,
                &coefficient_name,
            )?;
            Self::add_parameter_leaf(&mut graph, &term.coefficient.phase.name, &coefficient_name)?;

            let mut combination_nodes = Vec::new();
            for (combination, eval_list) in term.evaluation_lists.iter().enumerate() {
                let combination_name = format!("{}_combination_{}", term.name, combination);
                graph.add_node(
                    combination_name.as_str(),
                    ValueKind::ComplexVector,
                    Box::new(MultAll::new(ValueKind::ComplexVector)),
                )?;
                graph.link_child(&combination_name, &coefficient_name)?;

                for (depth, decay) in term.chain.iter().enumerate() {
                    let subsystem = Subsystem::new(
                        decay
                            .subsystem_slots
                            .iter()
                            .map(|&slot| eval_list[slot as usize])
                            .collect(),
                    );
                    let child = Subsystem::new(
                        decay
                            .child_slots
                            .iter()
                            .map(|&slot| eval_list[slot as usize])
                            .collect(),
                    );
                    let mass_sq = KinVariable::mass_sq(subsystem.clone());
                    let cos_theta = KinVariable::cos_theta(subsystem.clone(), child.clone());
                    let phi = KinVariable::phi(subsystem.clone(), child.clone());
                    variables.insert(mass_sq.clone());
                    variables.insert(cos_theta.clone());
                    variables.insert(phi.clone());

                    let slots_name = format!("slots_{}", subsystem.label());
                    let slots_value = Value::UIntVector(
                        subsystem.indices().iter().map(|&slot| slot as u32).collect(),
                    );

                    let mother = &self.description.particles[decay.mother as usize];
                    let d1 = &self.description.particles[decay.daughters.0 as usize];
                    let d2 = &self.description.particles[decay.daughters.1 as usize];
                    let angular_name =
                        format!("{}_c{}_d{}_angular", term.name, combination, depth);
                    graph.add_node(
                        angular_name.as_str(),
                        ValueKind::ComplexVector,
                        Box::new(HelicityAngular::new(
                            mother.spin2,
                            mother.helicity2,
                            d1.helicity2 - d2.helicity2,
                        )),
                    )?;
                    graph.add_leaf(
                        slots_name.as_str(),
                        LeafBinding::Constant(slots_value.clone()),
                        &angular_name,
                    )?;
                    Self::add_column_leaf(&mut graph, partition, &cos_theta, &angular_name)?;
                    Self::add_column_leaf(&mut graph, partition, &phi, &angular_name)?;

                    let dynamical_name =
                        format!("{}_c{}_d{}_dynamical", term.name, combination, depth);
                    match &decay.lineshape {
                        LineshapeSpec::NonResonant => {
                            graph.add_node(
                                dynamical_name.as_str(),
                                ValueKind::ComplexVector,
                                Box::new(NonResonant),
                            )?;
                            graph.add_leaf(
                                slots_name.as_str(),
                                LeafBinding::Constant(slots_value.clone()),
                                &dynamical_name,
                            )?;
                            Self::add_column_leaf(
                                &mut graph,
                                partition,
                                &mass_sq,
                                &dynamical_name,
                            )?;
                        }
                        LineshapeSpec::RelativisticBreitWigner { mass, width } => {
                            graph.add_node(
                                dynamical_name.as_str(),
                                ValueKind::ComplexVector,
                                Box::new(RelativisticBreitWigner),
                            )?;
                            graph.add_leaf(
                                slots_name.as_str(),
                                LeafBinding::Constant(slots_value.clone()),
                                &dynamical_name,
                            )?;
                            Self::add_column_leaf(
                                &mut graph,
                                partition,
                                &mass_sq,
                                &dynamical_name,
                            )?;
                            Self::add_parameter_leaf(&mut graph, &mass.name, &dynamical_name)?;
                            Self::add_parameter_leaf(&mut graph, &width.name, &dynamical_name)?;
                        }
                        LineshapeSpec::Flatte {
                            mass,
                            g1,
                            g2,
                            channel1,
                            channel2,
                        } => {
                            graph.add_node(
                                dynamical_name.as_str(),
                                ValueKind::ComplexVector,
                                Box::new(Flatte::new(*channel1, *channel2)),
                            )?;
                            graph.add_leaf(
                                slots_name.as_str(),
                                LeafBinding::Constant(slots_value.clone()),
                                &dynamical_name,
                            )?;
                            Self::add_column_leaf(
                                &mut graph,
                                partition,
                                &mass_sq,
                                &dynamical_name,
                            )?;
                            Self::add_parameter_leaf(&mut graph, &mass.name, &dynamical_name)?;
                            Self::add_parameter_leaf(&mut graph, &g1.name, &dynamical_name)?;
                            Self::add_parameter_leaf(&mut graph, &g2.name, &dynamical_name)?;
                        }
                    }
                    graph.link_child(&combination_name, &angular_name)?;
                    graph.link_child(&combination_name, &dynamical_name)?;
                }
                combination_nodes.push(combination_name);
            }

            // A single final-state combination needs no summation node.
            let combinatorial_name = if combination_nodes.len() == 1 {
                combination_nodes.remove(0)
            } else {
                let name = format!("{}_combinatorial", term.name);
                graph.add_node(
                    name.as_str(),
                    ValueKind::ComplexVector,
                    Box::new(AddAll::new(ValueKind::ComplexVector)),
                )?;
                for combination_name in &combination_nodes {
                    graph.link_child(&name, combination_name)?;
                }
                name
            };

            let term_name = format!("{}_parity_corrected", term.name);
            graph.add_node(
                term_name.as_str(),
                ValueKind::ComplexVector,
                Box::new(MultAll::new(ValueKind::ComplexVector)),
            )?;
            graph.add_leaf(
                format!("{}_parity_factor", term.name),
                LeafBinding::Constant(Value::Scalar(term.parity_factor)),
                &term_name,
            )?;
            graph.link_child(&term_name, &combinatorial_name)?;

            term_nodes.push((self.incoherent_set(term), term_name));
        }

        let background_name = match &self.description.background {
            Some(background) => {
                let name = "background_coherent".to_string();
                graph.add_node(
                    name.as_str(),
                    ValueKind::ComplexScalar,
                    Box::new(Complexify::new(ValueKind::ComplexScalar)),
                )?;
                Self::add_parameter_leaf(&mut graph, &background.magnitude.name, &name)?;
                Self::add_parameter_leaf(&mut graph, &background.phase.name, &name)?;
                Some(name)
            }
            None => None,
        };

        // Terms interfere iff their incoherent particle-index sets are equal;
        // the sets are the group keys, so grouping is the equivalence-class
        // partition.
        let mut groups: BTreeMap<BTreeSet<u32>, Vec<String>> = BTreeMap::new();
        for (set, node) in term_nodes {
            groups.entry(set).or_default().push(node);
        }

        graph.add_node(
            "coherent_sum",
            ValueKind::Vector,
            Box::new(AddAll::new(ValueKind::Vector)),
        )?;

        if groups.is_empty() {
            if let Some(background) = &background_name {
                let squared = "coherent_group_1_sq";
                graph.add_node(
                    squared,
                    ValueKind::Vector,
                    Box::new(AbsSquare::new(ValueKind::Vector)),
                )?;
                graph.link_child(squared, background)?;
                graph.link_child("coherent_sum", squared)?;
            }
        } else {
            for (index, members) in groups.values().enumerate() {
                let label = index + 1;
                let mut summands: Vec<&str> =
                    members.iter().map(String::as_str).collect();
                if let Some(background) = &background_name {
                    summands.push(background);
                }
                // A one-element group passes through without a summation node.
                let sum_name = if summands.len() == 1 {
                    summands[0].to_string()
                } else {
                    let name = format!("coherent_group_{label}");
                    graph.add_node(
                        name.as_str(),
                        ValueKind::ComplexVector,
                        Box::new(AddAll::new(ValueKind::ComplexVector)),
                    )?;
                    for summand in &summands {
                        graph.link_child(&name, summand)?;
                    }
                    name
                };
                let squared = format!("coherent_group_{label}_sq");
                graph.add_node(
                    squared.as_str(),
                    ValueKind::Vector,
                    Box::new(AbsSquare::new(ValueKind::Vector)),
                )?;
                graph.link_child(&squared, &sum_name)?;
                graph.link_child("coherent_sum", &squared)?;
            }
        }

        graph.set_head("coherent_sum")?;
        graph.resolve_links()?;
        Ok(AmplitudeGraph {
            graph,
            variables: variables.into_iter().collect(),
        })
    }
}
