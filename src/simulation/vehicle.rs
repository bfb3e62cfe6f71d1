//! Vehicle kinematics for the junction simulation
//!
//! A vehicle is a point moving towards the stop line at constant speed. The
//! container holding it (a lane or the box) decides whether a proposed move is
//! committed.

use super::types::{left_turn_direction, VehicleKind};

/// A car or bus travelling from one arm of the junction to another
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    kind: VehicleKind,
    /// Speed in metres per second
    speed: f64,
    /// Arm the vehicle arrived on
    source: usize,
    /// Arm the vehicle is heading for
    destination: usize,
    /// Signed distance to the stop line (or to the box exit once inside the box)
    distance: f64,
    /// Total time spent held in a queue, in milliseconds
    wait_ms: u64,
    /// Lane the vehicle left its arm from, set on box entry
    source_lane: Option<usize>,
    /// Number of arms in the junction
    num_arms: usize,
}

impl Vehicle {
    pub fn new(
        kind: VehicleKind,
        speed: f64,
        source: usize,
        destination: usize,
        distance: f64,
        num_arms: usize,
    ) -> Self {
        Self {
            kind,
            speed,
            source,
            destination,
            distance,
            wait_ms: 0,
            source_lane: None,
            num_arms,
        }
    }

    pub fn car(speed: f64, source: usize, destination: usize, distance: f64, num_arms: usize) -> Self {
        Self::new(VehicleKind::Car, speed, source, destination, distance, num_arms)
    }

    pub fn bus(speed: f64, source: usize, destination: usize, distance: f64, num_arms: usize) -> Self {
        Self::new(VehicleKind::Bus, speed, source, destination, distance, num_arms)
    }

    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    pub fn is_bus(&self) -> bool {
        self.kind == VehicleKind::Bus
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn destination(&self) -> usize {
        self.destination
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn length(&self) -> f64 {
        self.kind.length()
    }

    pub fn stopping_distance(&self) -> f64 {
        self.kind.stopping_distance()
    }

    pub fn wait_ms(&self) -> u64 {
        self.wait_ms
    }

    pub fn source_lane(&self) -> Option<usize> {
        self.source_lane
    }

    /// Position the vehicle would reach after moving freely for `step_ms`.
    /// Nothing is committed.
    pub fn next_distance(&self, step_ms: u64) -> f64 {
        self.distance - self.speed * step_ms as f64 / 1000.0
    }

    pub fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
    }

    pub(crate) fn set_source_lane(&mut self, lane: usize) {
        self.source_lane = Some(lane);
    }

    /// Records that the vehicle was held in place for a step
    pub fn add_wait(&mut self, step_ms: u64) {
        self.wait_ms += step_ms;
    }

    /// Number of arms between source and destination, counted anticlockwise.
    /// For four arms: 0 = U-turn, 1 = right, 2 = straight on, 3 = left.
    pub fn relative_direction(&self) -> usize {
        let n = self.num_arms.max(1);
        (self.source % n + n - self.destination % n) % n
    }

    pub fn is_turning_left(&self) -> bool {
        self.relative_direction() == left_turn_direction(self.num_arms)
    }
}
