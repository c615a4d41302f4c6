//! Derivation of kinematic variables from events.

use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_core::Event;

use crate::variables::{KinVariable, VariableKind};

/// Checks that a variable can be derived from events shaped like `sample`.
pub fn check_derivable(variable: &KinVariable, sample: &Event) -> Result<(), PwaError> {
    let slots = sample.len() as u16;
    let out_of_range = variable
        .subsystem
        .max_index()
        .map(|idx| idx >= slots)
        .unwrap_or(false)
        || variable
            .child
            .max_index()
            .map(|idx| idx >= slots)
            .unwrap_or(false);
    if out_of_range {
        return Err(PwaError::Storage(
            ErrorInfo::new(
                "unknown-variable",
                "variable references a final-state slot outside the event",
            )
            .with_context("variable", variable.label())
            .with_context("event_slots", slots.to_string()),
        ));
    }
    if variable.subsystem.indices().is_empty() {
        return Err(PwaError::Storage(
            ErrorInfo::new("unknown-variable", "variable has an empty subsystem")
                .with_context("variable", variable.label()),
        ));
    }
    Ok(())
}

/// Derives one scalar from one event.
///
/// Decay angles are measured in the subsystem rest frame: all referenced
/// momenta are boosted there and the polar axis is the lab direction of the
/// subsystem, so the angles are the usual helicity-frame decay angles.
pub fn derive(variable: &KinVariable, event: &Event) -> f64 {
    let subsystem = event.subsystem_momentum(variable.subsystem.indices());
    match variable.kind {
        VariableKind::InvariantMassSq => subsystem.mass_sq(),
        VariableKind::CosHelicityTheta | VariableKind::HelicityPhi => {
            let child = event.subsystem_momentum(variable.child.indices());
            let (bx, by, bz) = subsystem.boost_to_rest();
            let child_rf = child.boosted(bx, by, bz);
            // Rotate so the polar axis points along the subsystem lab
            // direction; for a subsystem at rest in the lab the axis stays z.
            let axis_p = subsystem.momentum();
            let rotated = if axis_p == 0.0 {
                child_rf
            } else {
                rotate_z_to(child_rf, subsystem)
            };
            if variable.kind == VariableKind::CosHelicityTheta {
                rotated.cos_theta()
            } else {
                rotated.phi()
            }
        }
    }
}

/// Rotates `v` into the frame whose z axis is the direction of `axis`.
fn rotate_z_to(v: pwa_core::FourVector, axis: pwa_core::FourVector) -> pwa_core::FourVector {
    let theta = axis.cos_theta().acos();
    let phi = axis.phi();
    // Inverse rotation R_y(-theta) R_z(-phi) applied to the spatial part.
    let (sp, cp) = phi.sin_cos();
    let (st, ct) = theta.sin_cos();
    let x1 = cp * v.px + sp * v.py;
    let y1 = -sp * v.px + cp * v.py;
    let z1 = v.pz;
    pwa_core::FourVector {
        e: v.e,
        px: ct * x1 - st * z1,
        py: y1,
        pz: st * x1 + ct * z1,
    }
}
