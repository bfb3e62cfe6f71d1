//! Errors raised while building or running a junction

use std::fmt;

/// Errors the engine reports instead of silently dropping vehicles or
/// building an unusable junction.
#[derive(Debug, Clone, PartialEq)]
pub enum JunctionError {
    /// An arriving vehicle could not be placed because its lane is full.
    /// Fatal to the current run.
    CapacityExceeded {
        arm: usize,
        lane: usize,
        required_distance: f64,
        arm_length: f64,
    },
    /// Bus and left-turn lanes used up every lane of the arm.
    InsufficientLanes { requested: usize, reserved: usize },
    /// Demand exists for a movement that no lane of the source arm allows.
    UnservedMovement { source: usize, destination: usize },
}

impl fmt::Display for JunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JunctionError::CapacityExceeded {
                arm,
                lane,
                required_distance,
                arm_length,
            } => write!(
                f,
                "Capacity exceeded on arm {arm}, lane {lane}: a new vehicle needs {required_distance:.1}m but the arm is {arm_length:.1}m long"
            ),
            JunctionError::InsufficientLanes {
                requested,
                reserved,
            } => write!(
                f,
                "Insufficient lanes: {requested} requested but {reserved} are reserved for bus and left-turn traffic"
            ),
            JunctionError::UnservedMovement {
                source,
                destination,
            } => write!(
                f,
                "No lane on arm {source} allows traffic bound for arm {destination}"
            ),
        }
    }
}

impl std::error::Error for JunctionError {}
