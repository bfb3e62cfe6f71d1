//! Standalone junction simulation module
//!
//! This module contains the whole traffic engine: vehicles, lanes, arms, the
//! conflict box and the signal controller, driven by [`Junction`]. It has no
//! presentation layer and can be exercised entirely from tests or the
//! headless runner.

mod arm;
mod config;
mod conflict_box;
mod error;
mod junction;
mod kpi;
mod lane;
mod traffic_light;
mod types;
mod vehicle;

pub use arm::Arm;
pub use config::{
    CrossingConfig, JunctionConfig, DEFAULT_ALL_RED_GAP_MS, DEFAULT_ARM_LENGTH,
    DEFAULT_LANE_WIDTH, DEFAULT_PHASE_DURATION_MS, DEFAULT_VEHICLE_SPEED,
};
pub use conflict_box::ConflictBox;
pub use error::JunctionError;
pub use junction::Junction;
pub use kpi::{efficiency_score, ArmKpi, KpiWeights};
pub use lane::{Departures, Lane};
pub use traffic_light::{CrossingState, LightPhase, TrafficLight};
pub use types::{
    left_arm, left_turn_direction, LaneKind, LaneRef, VehicleKind, BUS_LENGTH, CAR_LENGTH,
    MS_PER_HOUR, PROXIMITY_THRESHOLD, SPAWN_GAP,
};
pub use vehicle::Vehicle;
