//! Core types and constants for the junction simulation

/// Length of a car in metres (UK average)
pub const CAR_LENGTH: f64 = 4.4;

/// Length of a bus in metres (typically 9 to 11m)
pub const BUS_LENGTH: f64 = 10.0;

/// Distance from the stop line within which a vehicle counts as waiting for the light
pub const PROXIMITY_THRESHOLD: f64 = 100.0;

/// Gap between the rearmost vehicle of a lane and a newly arriving one.
/// Never smaller than the longest vehicle plus its stopping distance.
pub const SPAWN_GAP: f64 = BUS_LENGTH * 1.5;

/// Milliseconds in an hour, used to turn hourly rates into inter-arrival means
pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Class of a simulated vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleKind {
    Car,
    Bus,
}

impl VehicleKind {
    /// Body length in metres
    pub fn length(self) -> f64 {
        match self {
            VehicleKind::Car => CAR_LENGTH,
            VehicleKind::Bus => BUS_LENGTH,
        }
    }

    /// Minimum gap kept to the vehicle ahead, half the body length
    pub fn stopping_distance(self) -> f64 {
        self.length() / 2.0
    }
}

/// The three kinds of lane an arm can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// General traffic, restricted only by its permitted directions
    Ordinary,
    /// Buses only
    Bus,
    /// Left-turning traffic only, with its own right-of-way rule at the box
    LeftTurn,
}

/// Identifies a lane by the arm it belongs to and its index within that arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneRef {
    pub arm: usize,
    pub index: usize,
    pub kind: LaneKind,
}

/// The arm one step anticlockwise from `arm`
pub fn left_arm(arm: usize, num_arms: usize) -> usize {
    (arm + 1) % num_arms
}

/// Relative direction that denotes a left turn for a junction with `num_arms` arms
pub fn left_turn_direction(num_arms: usize) -> usize {
    num_arms.saturating_sub(1)
}
