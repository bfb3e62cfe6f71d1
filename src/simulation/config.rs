//! Junction configuration
//!
//! Values arrive here already validated by whatever front-end built them; the
//! engine only rejects lane layouts it cannot construct.

/// Default length of a green phase before the light reconsiders
pub const DEFAULT_PHASE_DURATION_MS: u64 = 20_000;

/// Default all-red gap between two green phases
pub const DEFAULT_ALL_RED_GAP_MS: u64 = 5_000;

/// Default lane width in metres
pub const DEFAULT_LANE_WIDTH: f64 = 3.0;

/// Default length of an approach in metres
pub const DEFAULT_ARM_LENGTH: f64 = 500.0;

/// Default vehicle speed in metres per second (30 mph)
pub const DEFAULT_VEHICLE_SPEED: f64 = 13.4;

/// Pedestrian crossing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingConfig {
    /// How long a crossing holds every arm at red, in seconds
    pub duration_s: u64,
    /// Mean number of crossing requests per hour
    pub requests_per_hour: f64,
}

/// Everything needed to build a [`Junction`](super::Junction)
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionConfig {
    /// Vehicles per hour, indexed `[source][destination]`. Its size sets the arm count.
    pub demand: Vec<Vec<f64>>,
    /// Lanes per arm, including any bus and left-turn lanes
    pub lanes_per_arm: usize,
    /// Permitted relative directions for each ordinary lane, left to right
    pub lane_directions: Option<Vec<Vec<usize>>>,
    pub bus_lane: bool,
    /// Fraction of arrivals that are buses, between 0 and 1
    pub bus_ratio: f64,
    pub left_turn_lane: bool,
    pub crossing: Option<CrossingConfig>,
    pub phase_duration_ms: u64,
    pub all_red_gap_ms: u64,
    pub lane_width: f64,
    pub arm_length: f64,
    pub vehicle_speed: f64,
    pub duration_ms: u64,
    pub step_ms: u64,
}

impl Default for JunctionConfig {
    fn default() -> Self {
        Self::uniform(4, 0.0)
    }
}

impl JunctionConfig {
    /// A junction with `num_arms` arms and the same demand between every pair of distinct arms
    pub fn uniform(num_arms: usize, vehicles_per_hour: f64) -> Self {
        let demand = (0..num_arms)
            .map(|source| {
                (0..num_arms)
                    .map(|destination| {
                        if source == destination {
                            0.0
                        } else {
                            vehicles_per_hour
                        }
                    })
                    .collect()
            })
            .collect();
        Self::from_demand(demand)
    }

    /// A junction built from an explicit origin/destination matrix
    pub fn from_demand(demand: Vec<Vec<f64>>) -> Self {
        Self {
            demand,
            lanes_per_arm: 2,
            lane_directions: None,
            bus_lane: false,
            bus_ratio: 0.0,
            left_turn_lane: false,
            crossing: None,
            phase_duration_ms: DEFAULT_PHASE_DURATION_MS,
            all_red_gap_ms: DEFAULT_ALL_RED_GAP_MS,
            lane_width: DEFAULT_LANE_WIDTH,
            arm_length: DEFAULT_ARM_LENGTH,
            vehicle_speed: DEFAULT_VEHICLE_SPEED,
            duration_ms: 60 * 60 * 1000,
            step_ms: 100,
        }
    }

    pub fn num_arms(&self) -> usize {
        self.demand.len()
    }

    /// Vehicles per hour from `source` to `destination`; zero outside the matrix
    pub fn demand_between(&self, source: usize, destination: usize) -> f64 {
        self.demand
            .get(source)
            .and_then(|row| row.get(destination))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn with_lanes(mut self, lanes_per_arm: usize) -> Self {
        self.lanes_per_arm = lanes_per_arm;
        self
    }

    pub fn with_lane_directions(mut self, directions: Vec<Vec<usize>>) -> Self {
        self.lane_directions = Some(directions);
        self
    }

    pub fn with_bus_lane(mut self, bus_ratio: f64) -> Self {
        self.bus_lane = true;
        self.bus_ratio = bus_ratio;
        self
    }

    pub fn with_bus_ratio(mut self, bus_ratio: f64) -> Self {
        self.bus_ratio = bus_ratio;
        self
    }

    pub fn with_left_turn_lane(mut self) -> Self {
        self.left_turn_lane = true;
        self
    }

    pub fn with_crossing(mut self, duration_s: u64, requests_per_hour: f64) -> Self {
        self.crossing = Some(CrossingConfig {
            duration_s,
            requests_per_hour,
        });
        self
    }

    pub fn with_timing(mut self, phase_duration_ms: u64, all_red_gap_ms: u64) -> Self {
        self.phase_duration_ms = phase_duration_ms;
        self.all_red_gap_ms = all_red_gap_ms;
        self
    }

    pub fn with_run(mut self, duration_ms: u64, step_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self.step_ms = step_ms;
        self
    }

    pub fn with_geometry(mut self, lane_width: f64, arm_length: f64) -> Self {
        self.lane_width = lane_width;
        self.arm_length = arm_length;
        self
    }

    pub fn with_vehicle_speed(mut self, vehicle_speed: f64) -> Self {
        self.vehicle_speed = vehicle_speed;
        self
    }
}
