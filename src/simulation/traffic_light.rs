//! Signal controller for the junction
//!
//! One arm at a time holds the green. Phases end when the green arm empties or
//! the phase timer runs out, followed by an all-red gap before the next
//! occupied arm (scanning anticlockwise) gets the green. A pedestrian crossing
//! can hold the all-red for its full duration.

use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Exp};

use super::config::CrossingConfig;
use super::types::{left_arm, MS_PER_HOUR};

/// Which arm, if any, currently has right of way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightPhase {
    Green(usize),
    /// Every arm is red; the next green is due once `remaining_ms` runs out
    AllRed { remaining_ms: i64 },
}

/// Pedestrian crossing sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingState {
    Inactive,
    /// A request is waiting for the next all-red gap
    Queued,
    /// Pedestrians are crossing; every arm is held at red
    Active { remaining_ms: i64 },
}

#[derive(Debug, Clone)]
struct PedestrianCrossing {
    state: CrossingState,
    duration_ms: i64,
    /// Time until the next request arrives
    next_request_ms: f64,
    /// Inter-arrival distribution; `None` when only manual requests are made
    interval: Option<Exp<f64>>,
}

impl PedestrianCrossing {
    fn new<R: Rng + ?Sized>(config: CrossingConfig, rng: &mut R) -> Self {
        let interval = if config.requests_per_hour > 0.0 {
            Exp::new(config.requests_per_hour / MS_PER_HOUR).ok()
        } else {
            None
        };
        let next_request_ms = interval.as_ref().map_or(f64::INFINITY, |exp| exp.sample(rng));
        Self {
            state: CrossingState::Inactive,
            duration_ms: config.duration_s as i64 * 1000,
            next_request_ms,
            interval,
        }
    }

    fn advance<R: Rng + ?Sized>(&mut self, step_ms: i64, all_red_started: bool, rng: &mut R) {
        match self.state {
            CrossingState::Active { remaining_ms } => {
                let remaining_ms = remaining_ms - step_ms;
                if remaining_ms <= 0 {
                    debug!("Pedestrian crossing finished");
                    self.state = CrossingState::Inactive;
                } else {
                    self.state = CrossingState::Active { remaining_ms };
                }
            }
            CrossingState::Queued if all_red_started => {
                debug!("Pedestrian crossing started for {}ms", self.duration_ms);
                self.state = CrossingState::Active {
                    remaining_ms: self.duration_ms,
                };
            }
            CrossingState::Queued => {}
            CrossingState::Inactive => {
                self.next_request_ms -= step_ms as f64;
                if self.next_request_ms <= 0.0 {
                    self.state = CrossingState::Queued;
                    self.next_request_ms = self
                        .interval
                        .as_ref()
                        .map_or(f64::INFINITY, |exp| exp.sample(rng));
                }
            }
        }
    }
}

/// The junction's traffic light controller
#[derive(Debug, Clone)]
pub struct TrafficLight {
    num_arms: usize,
    phase: LightPhase,
    /// Time left before the green phase is reconsidered
    phase_timer_ms: i64,
    phase_duration_ms: i64,
    all_red_gap_ms: i64,
    /// Arm that held the green before the current all-red
    previous_green: usize,
    crossing: Option<PedestrianCrossing>,
}

impl TrafficLight {
    /// Starts with arm 0 on green
    pub fn new<R: Rng + ?Sized>(
        num_arms: usize,
        phase_duration_ms: u64,
        all_red_gap_ms: u64,
        crossing: Option<CrossingConfig>,
        rng: &mut R,
    ) -> Self {
        Self {
            num_arms,
            phase: LightPhase::Green(0),
            phase_timer_ms: phase_duration_ms as i64,
            phase_duration_ms: phase_duration_ms as i64,
            all_red_gap_ms: all_red_gap_ms as i64,
            previous_green: 0,
            crossing: crossing.map(|config| PedestrianCrossing::new(config, rng)),
        }
    }

    pub fn num_arms(&self) -> usize {
        self.num_arms
    }

    pub fn phase(&self) -> LightPhase {
        self.phase
    }

    /// The arm with right of way, or `None` during an all-red gap
    pub fn green_arm(&self) -> Option<usize> {
        match self.phase {
            LightPhase::Green(arm) => Some(arm),
            LightPhase::AllRed { .. } => None,
        }
    }

    pub fn previous_green(&self) -> usize {
        self.previous_green
    }

    pub fn crossing_state(&self) -> Option<CrossingState> {
        self.crossing.as_ref().map(|c| c.state)
    }

    /// Whether a pedestrian crossing is holding every arm at red
    pub fn crossing_active(&self) -> bool {
        matches!(self.crossing_state(), Some(CrossingState::Active { .. }))
    }

    pub fn crossing_queued(&self) -> bool {
        self.crossing_state() == Some(CrossingState::Queued)
    }

    /// Presses the crossing button. Has no effect without a crossing or while
    /// one is already queued or active.
    pub fn request_crossing(&mut self) {
        if let Some(crossing) = &mut self.crossing {
            if crossing.state == CrossingState::Inactive {
                crossing.state = CrossingState::Queued;
            }
        }
    }

    /// Advances the controller by one step.
    ///
    /// `waiting[arm]` tells whether that arm has a vehicle within the
    /// proximity threshold of its stop line.
    pub fn advance<R: Rng + ?Sized>(&mut self, step_ms: u64, waiting: &[bool], rng: &mut R) {
        let step_ms = step_ms as i64;

        match self.phase {
            LightPhase::Green(arm) => self.advance_green(arm, step_ms, waiting),
            LightPhase::AllRed { remaining_ms } => {
                if !self.crossing_active() {
                    self.advance_all_red(remaining_ms, step_ms, waiting);
                }
            }
        }

        // Nobody anywhere near the junction: rest on all-red so the first
        // arrival only has to wait out the gap
        if !waiting.iter().any(|w| *w) {
            self.phase = LightPhase::AllRed {
                remaining_ms: self.all_red_gap_ms,
            };
        }

        let all_red_started = self.phase
            == LightPhase::AllRed {
                remaining_ms: self.all_red_gap_ms,
            };
        if let Some(crossing) = &mut self.crossing {
            crossing.advance(step_ms, all_red_started, rng);
        }
    }

    fn advance_green(&mut self, arm: usize, step_ms: i64, waiting: &[bool]) {
        self.phase_timer_ms -= step_ms;

        let arm_waiting = waiting.get(arm).copied().unwrap_or(false);
        if arm_waiting && self.phase_timer_ms > 0 {
            return;
        }

        let others_waiting = waiting
            .iter()
            .enumerate()
            .any(|(other, w)| other != arm && *w);
        if !others_waiting && !self.crossing_queued() {
            self.phase_timer_ms = self.phase_duration_ms;
            return;
        }

        debug!("Arm {arm} green phase ended");
        self.previous_green = arm;
        self.phase = LightPhase::AllRed {
            remaining_ms: self.all_red_gap_ms,
        };
    }

    fn advance_all_red(&mut self, remaining_ms: i64, step_ms: i64, waiting: &[bool]) {
        let remaining_ms = remaining_ms - step_ms;
        if remaining_ms > 0 {
            self.phase = LightPhase::AllRed { remaining_ms };
            return;
        }

        self.phase_timer_ms = self.phase_duration_ms;
        let mut arm = self.previous_green;
        for _ in 0..self.num_arms {
            arm = left_arm(arm, self.num_arms);
            if waiting.get(arm).copied().unwrap_or(false) {
                break;
            }
        }
        debug!("Arm {arm} turned green");
        self.phase = LightPhase::Green(arm);
    }
}
