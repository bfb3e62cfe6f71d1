//! A single lane of an approach
//!
//! Vehicles are kept closest-to-the-stop-line first. Each step the head may
//! hand itself over to the conflict box; everyone behind follows at a
//! class-dependent stopping distance.

use std::collections::VecDeque;

use super::conflict_box::ConflictBox;
use super::traffic_light::TrafficLight;
use super::types::{left_turn_direction, LaneKind, LaneRef};
use super::vehicle::Vehicle;

/// Summary of the vehicles that left a lane for the box during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Departures {
    pub count: u64,
    pub total_wait_ms: u64,
    pub max_wait_ms: u64,
}

impl Departures {
    fn record(&mut self, vehicle: &Vehicle) {
        self.count += 1;
        self.total_wait_ms += vehicle.wait_ms();
        self.max_wait_ms = self.max_wait_ms.max(vehicle.wait_ms());
    }

    pub fn merge(&mut self, other: Departures) {
        self.count += other.count;
        self.total_wait_ms += other.total_wait_ms;
        self.max_wait_ms = self.max_wait_ms.max(other.max_wait_ms);
    }
}

/// One lane of an arm
#[derive(Debug, Clone)]
pub struct Lane {
    kind: LaneKind,
    /// Relative directions a vehicle in this lane may take
    directions: Vec<usize>,
    width: f64,
    /// Vehicles in queue order, nearest the stop line first
    vehicles: VecDeque<Vehicle>,
    /// Longest queue seen in this lane
    max_queue_length: usize,
}

impl Lane {
    pub fn new(kind: LaneKind, directions: Vec<usize>, width: f64) -> Self {
        Self {
            kind,
            directions,
            width,
            vehicles: VecDeque::new(),
            max_queue_length: 0,
        }
    }

    /// A general traffic lane
    pub fn ordinary(directions: Vec<usize>, width: f64) -> Self {
        Self::new(LaneKind::Ordinary, directions, width)
    }

    /// A lane for buses heading anywhere except back the way they came
    pub fn bus(num_arms: usize, width: f64) -> Self {
        Self::new(LaneKind::Bus, (1..num_arms).collect(), width)
    }

    /// A lane reserved for left turns
    pub fn left_turn(num_arms: usize, width: f64) -> Self {
        Self::new(LaneKind::LeftTurn, vec![left_turn_direction(num_arms)], width)
    }

    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    pub fn directions(&self) -> &[usize] {
        &self.directions
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn vehicles(&self) -> &VecDeque<Vehicle> {
        &self.vehicles
    }

    pub fn queue_length(&self) -> usize {
        self.vehicles.len()
    }

    pub fn max_queue_length(&self) -> usize {
        self.max_queue_length
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// The vehicle nearest the stop line
    pub fn head(&self) -> Option<&Vehicle> {
        self.vehicles.front()
    }

    /// Distance of the vehicle furthest from the stop line, or zero when empty
    pub fn furthest_distance(&self) -> f64 {
        self.vehicles.back().map_or(0.0, Vehicle::distance)
    }

    /// Whether `vehicle` is allowed to travel in this lane
    pub fn can_enter_lane(&self, vehicle: &Vehicle) -> bool {
        if !self.directions.contains(&vehicle.relative_direction()) {
            return false;
        }
        match self.kind {
            LaneKind::Ordinary => true,
            LaneKind::Bus => vehicle.is_bus(),
            LaneKind::LeftTurn => vehicle.is_turning_left(),
        }
    }

    /// Inserts a vehicle at the position its distance dictates
    pub fn add_vehicle(&mut self, vehicle: Vehicle) {
        let index = self.insertion_index(vehicle.distance());
        self.insert_at(index, vehicle);
    }

    pub(crate) fn insert_at(&mut self, index: usize, vehicle: Vehicle) {
        self.vehicles.insert(index, vehicle);
        self.max_queue_length = self.max_queue_length.max(self.vehicles.len());
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Option<Vehicle> {
        self.vehicles.remove(index)
    }

    fn insertion_index(&self, distance: f64) -> usize {
        self.vehicles.partition_point(|v| v.distance() < distance)
    }

    /// Finds where `vehicle` could merge into this lane without closing on
    /// either neighbour by less than the follower's stopping distance.
    /// Returns the insertion index, or `None` when there is no room.
    pub fn enough_space_to_merge(&self, vehicle: &Vehicle) -> Option<usize> {
        let index = self.insertion_index(vehicle.distance());

        if let Some(ahead) = index.checked_sub(1).and_then(|i| self.vehicles.get(i)) {
            let gap = vehicle.distance() - (ahead.distance() + ahead.length());
            if gap <= vehicle.stopping_distance() {
                return None;
            }
        }

        if let Some(behind) = self.vehicles.get(index) {
            let gap = behind.distance() - (vehicle.distance() + vehicle.length());
            if gap <= behind.stopping_distance() {
                return None;
            }
        }

        Some(index)
    }

    /// Moves every vehicle in the lane forward by one step.
    ///
    /// The head vehicle asks the box for entry once its next position would
    /// reach the stop line; followers close up to the vehicle ahead but never
    /// nearer than their stopping distance. Vehicles that cannot move accrue
    /// wait time.
    pub fn advance(
        &mut self,
        lane: LaneRef,
        step_ms: u64,
        light: &TrafficLight,
        conflict_box: &mut ConflictBox,
    ) -> Departures {
        let mut departures = Departures::default();
        let mut index = 0;
        // Committed position and length of the vehicle ahead
        let mut leader: Option<(f64, f64)> = None;

        while index < self.vehicles.len() {
            let vehicle = &mut self.vehicles[index];
            let current = vehicle.distance();
            let next = vehicle.next_distance(step_ms);

            match leader {
                None if next <= 0.0 => {
                    if conflict_box.can_enter_box(vehicle, lane, light) {
                        if let Some(mut vehicle) = self.vehicles.pop_front() {
                            vehicle.set_distance(next);
                            vehicle.set_source_lane(lane.index);
                            departures.record(&vehicle);
                            conflict_box.add_vehicle(vehicle);
                        }
                        continue;
                    }
                    vehicle.add_wait(step_ms);
                }
                None => {
                    if next < current {
                        vehicle.set_distance(next);
                    } else {
                        vehicle.add_wait(step_ms);
                    }
                }
                Some((ahead_distance, ahead_length)) => {
                    let limit = ahead_distance + ahead_length + vehicle.stopping_distance();
                    let target = next.max(limit);
                    if target < current {
                        vehicle.set_distance(target);
                    } else {
                        vehicle.add_wait(step_ms);
                    }
                }
            }

            let vehicle = &self.vehicles[index];
            leader = Some((vehicle.distance(), vehicle.length()));
            index += 1;
        }

        departures
    }
}
