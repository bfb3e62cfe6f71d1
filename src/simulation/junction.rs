//! The junction that ties everything together
//!
//! This is the entry point for running the simulation. Each step generates
//! arrivals, updates the light, clears the box and then moves every arm, in
//! that order.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};

use super::arm::Arm;
use super::config::JunctionConfig;
use super::conflict_box::ConflictBox;
use super::error::JunctionError;
use super::kpi::{efficiency_score, ArmKpi, KpiWeights};
use super::traffic_light::TrafficLight;
use super::types::{VehicleKind, MS_PER_HOUR, PROXIMITY_THRESHOLD};
use super::vehicle::Vehicle;

/// Poisson arrivals for one origin/destination pair
#[derive(Debug, Clone)]
struct ArrivalProcess {
    source: usize,
    destination: usize,
    /// Inter-arrival distribution in milliseconds; `None` when there is no demand
    interval: Option<Exp<f64>>,
    /// Time until the next arrival
    timer_ms: f64,
}

impl ArrivalProcess {
    fn new<R: Rng + ?Sized>(
        source: usize,
        destination: usize,
        vehicles_per_hour: f64,
        rng: &mut R,
    ) -> Self {
        let interval = if vehicles_per_hour > 0.0 {
            Exp::new(vehicles_per_hour / MS_PER_HOUR).ok()
        } else {
            None
        };
        let timer_ms = interval.as_ref().map_or(f64::INFINITY, |exp| exp.sample(rng));
        Self {
            source,
            destination,
            interval,
            timer_ms,
        }
    }

    /// Counts down one step and returns how many vehicles arrived during it
    fn arrivals<R: Rng + ?Sized>(&mut self, step_ms: u64, rng: &mut R) -> usize {
        let Some(interval) = self.interval.as_ref() else {
            return 0;
        };
        self.timer_ms -= step_ms as f64;
        let mut count = 0;
        while self.timer_ms <= 0.0 {
            self.timer_ms += interval.sample(rng);
            count += 1;
        }
        count
    }
}

/// A signalised junction and everything on its approaches
pub struct Junction<R: Rng = StdRng> {
    config: JunctionConfig,
    arms: Vec<Arm>,
    conflict_box: ConflictBox,
    light: TrafficLight,
    arrivals: Vec<ArrivalProcess>,
    rng: R,
    elapsed_ms: u64,
    /// Set once an arm has overflowed; no further steps are taken
    failure: Option<JunctionError>,
}

impl Junction<StdRng> {
    /// Create a junction with a seeded RNG for reproducible runs
    pub fn with_seed(config: JunctionConfig, seed: u64) -> Result<Self, JunctionError> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Junction<R> {
    /// Builds the junction, drawing all random state from `rng`
    pub fn new(config: JunctionConfig, mut rng: R) -> Result<Self, JunctionError> {
        let num_arms = config.num_arms();
        let arms = (0..num_arms)
            .map(|index| Arm::new(index, &config))
            .collect::<Result<Vec<_>, _>>()?;

        let mut arrivals = Vec::new();
        for (source, arm) in arms.iter().enumerate() {
            for destination in (0..num_arms).filter(|&d| d != source) {
                let vehicles_per_hour = config.demand_between(source, destination);
                if vehicles_per_hour <= 0.0 {
                    continue;
                }
                let candidate =
                    Vehicle::car(config.vehicle_speed, source, destination, 0.0, num_arms);
                if !arm.serves(&candidate) {
                    return Err(JunctionError::UnservedMovement {
                        source,
                        destination,
                    });
                }
                arrivals.push(ArrivalProcess::new(
                    source,
                    destination,
                    vehicles_per_hour,
                    &mut rng,
                ));
            }
        }

        let max_lanes = arms.iter().map(|arm| arm.lanes().len()).max().unwrap_or(0);
        let conflict_box = ConflictBox::from_geometry(config.lane_width, max_lanes, num_arms);
        let light = TrafficLight::new(
            num_arms,
            config.phase_duration_ms,
            config.all_red_gap_ms,
            config.crossing,
            &mut rng,
        );

        info!(
            "Junction built: {} arms, {} lanes per arm, bus lane: {}, left-turn lane: {}, pedestrian crossing: {}",
            num_arms,
            config.lanes_per_arm,
            config.bus_lane,
            config.left_turn_lane,
            config.crossing.is_some()
        );

        Ok(Self {
            config,
            arms,
            conflict_box,
            light,
            arrivals,
            rng,
            elapsed_ms: 0,
            failure: None,
        })
    }

    pub fn config(&self) -> &JunctionConfig {
        &self.config
    }

    pub fn num_arms(&self) -> usize {
        self.arms.len()
    }

    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    pub fn arm(&self, index: usize) -> Option<&Arm> {
        self.arms.get(index)
    }

    pub fn arm_mut(&mut self, index: usize) -> Option<&mut Arm> {
        self.arms.get_mut(index)
    }

    pub fn conflict_box(&self) -> &ConflictBox {
        &self.conflict_box
    }

    pub fn traffic_light(&self) -> &TrafficLight {
        &self.light
    }

    pub fn traffic_light_mut(&mut self) -> &mut TrafficLight {
        &mut self.light
    }

    /// Simulated time so far, in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// The error that ended the run, if any
    pub fn failure(&self) -> Option<&JunctionError> {
        self.failure.as_ref()
    }

    /// Advances the whole junction by one step of `step_ms` milliseconds.
    ///
    /// Once an arm has overflowed the junction refuses to advance further and
    /// keeps returning the same error; its state stays readable.
    pub fn advance(&mut self, step_ms: u64) -> Result<(), JunctionError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        if let Err(e) = self.generate_arrivals(step_ms) {
            warn!("Run aborted after {}ms: {}", self.elapsed_ms, e);
            self.failure = Some(e.clone());
            return Err(e);
        }

        let waiting: Vec<bool> = self
            .arms
            .iter()
            .map(|arm| arm.has_vehicle_within(PROXIMITY_THRESHOLD))
            .collect();
        self.light.advance(step_ms, &waiting, &mut self.rng);

        self.conflict_box.advance(step_ms);

        for arm in &mut self.arms {
            arm.advance(step_ms, &self.light, &mut self.conflict_box);
        }

        self.elapsed_ms += step_ms;
        Ok(())
    }

    /// Runs `duration_ms / step_ms` steps, stopping at the first error
    pub fn simulate(&mut self, duration_ms: u64, step_ms: u64) -> Result<(), JunctionError> {
        if step_ms == 0 {
            return Ok(());
        }
        for _ in 0..duration_ms / step_ms {
            self.advance(step_ms)?;
        }
        Ok(())
    }

    /// Runs for the configured duration and step length
    pub fn run(&mut self) -> Result<(), JunctionError> {
        let result = self.simulate(self.config.duration_ms, self.config.step_ms);
        info!(
            "Run finished after {}ms with {} vehicles through the box",
            self.elapsed_ms,
            self.arm_throughputs().iter().sum::<u64>()
        );
        result
    }

    fn generate_arrivals(&mut self, step_ms: u64) -> Result<(), JunctionError> {
        for process in &mut self.arrivals {
            for _ in 0..process.arrivals(step_ms, &mut self.rng) {
                let kind = if self.rng.random::<f64>() < self.config.bus_ratio {
                    VehicleKind::Bus
                } else {
                    VehicleKind::Car
                };
                self.arms[process.source].create_vehicle(
                    kind,
                    process.destination,
                    self.config.vehicle_speed,
                )?;
            }
        }
        Ok(())
    }

    /// KPIs for every arm, including vehicles still queued
    pub fn kpis(&self) -> Vec<ArmKpi> {
        self.arms.iter().map(Arm::kpi).collect()
    }

    /// Vehicles that have fully crossed the box, per origin arm
    pub fn arm_throughputs(&self) -> &[u64] {
        self.conflict_box.arm_throughputs()
    }

    /// Junction-wide efficiency out of 100
    pub fn efficiency(&self, weights: KpiWeights) -> f64 {
        efficiency_score(&self.kpis(), weights)
    }
}
