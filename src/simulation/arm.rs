//! One approach to the junction
//!
//! An arm owns its lanes, places arriving vehicles, balances queues between
//! neighbouring lanes and keeps the running KPI totals for its traffic.

use log::debug;
use ordered_float::OrderedFloat;

use super::config::JunctionConfig;
use super::conflict_box::ConflictBox;
use super::error::JunctionError;
use super::kpi::ArmKpi;
use super::lane::{Departures, Lane};
use super::traffic_light::TrafficLight;
use super::types::{LaneKind, LaneRef, VehicleKind, SPAWN_GAP};
use super::vehicle::Vehicle;

/// A lane switch must leave the target at least this many vehicles shorter
const LANE_SWITCH_MARGIN: usize = 2;

/// An approach of the junction and its lanes
#[derive(Debug, Clone)]
pub struct Arm {
    index: usize,
    num_arms: usize,
    width: f64,
    length: f64,
    /// Bus lane first, then left-turn lane, then ordinary lanes
    lanes: Vec<Lane>,
    /// Wait accrued by vehicles that have already left for the box
    total_wait_ms: u64,
    /// Vehicles that have already left for the box
    vehicle_count: u64,
    max_wait_ms: u64,
    max_queue_length: usize,
    /// Vehicles placed on this arm, buses included
    arrival_count: u64,
    bus_arrival_count: u64,
}

impl Arm {
    /// Builds the arm's lane layout from the junction configuration
    pub fn new(index: usize, config: &JunctionConfig) -> Result<Self, JunctionError> {
        let num_arms = config.num_arms();
        let reserved = usize::from(config.bus_lane) + usize::from(config.left_turn_lane);
        if config.lanes_per_arm <= reserved {
            return Err(JunctionError::InsufficientLanes {
                requested: config.lanes_per_arm,
                reserved,
            });
        }

        let width = config.lane_width;
        let length = config.arm_length;
        let mut lanes = Vec::with_capacity(config.lanes_per_arm);
        if config.bus_lane {
            lanes.push(Lane::bus(num_arms, width));
        }
        if config.left_turn_lane {
            lanes.push(Lane::left_turn(num_arms, width));
        }
        let all_directions: Vec<usize> = (1..num_arms).collect();
        for i in 0..config.lanes_per_arm - reserved {
            let directions = config
                .lane_directions
                .as_ref()
                .and_then(|d| d.get(i))
                .cloned()
                .unwrap_or_else(|| all_directions.clone());
            lanes.push(Lane::ordinary(directions, width));
        }

        Ok(Self::with_lanes(index, num_arms, length, lanes))
    }

    /// Builds an arm around an explicit set of lanes
    pub fn with_lanes(index: usize, num_arms: usize, length: f64, lanes: Vec<Lane>) -> Self {
        let width: f64 = lanes.iter().map(Lane::width).sum();
        Self {
            index,
            num_arms,
            width,
            length,
            lanes,
            total_wait_ms: 0,
            vehicle_count: 0,
            max_wait_ms: 0,
            max_queue_length: 0,
            arrival_count: 0,
            bus_arrival_count: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lane(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    pub fn lane_mut(&mut self, index: usize) -> Option<&mut Lane> {
        self.lanes.get_mut(index)
    }

    /// Vehicles that have left this arm for the box
    pub fn vehicle_count(&self) -> u64 {
        self.vehicle_count
    }

    /// Vehicles that have arrived on this arm
    pub fn arrival_count(&self) -> u64 {
        self.arrival_count
    }

    pub fn bus_arrival_count(&self) -> u64 {
        self.bus_arrival_count
    }

    /// Distance of the vehicle nearest the stop line across all lanes
    pub fn nearest_vehicle_distance(&self) -> Option<f64> {
        self.lanes
            .iter()
            .filter_map(Lane::head)
            .map(|v| OrderedFloat(v.distance()))
            .min()
            .map(OrderedFloat::into_inner)
    }

    /// Whether any lane has its head vehicle closer than `distance` to the stop line
    pub fn has_vehicle_within(&self, distance: f64) -> bool {
        self.nearest_vehicle_distance()
            .is_some_and(|nearest| nearest < distance)
    }

    /// Whether any lane of this arm will accept `vehicle`
    pub fn serves(&self, vehicle: &Vehicle) -> bool {
        self.lanes.iter().any(|lane| lane.can_enter_lane(vehicle))
    }

    /// Picks the lane for a new arrival: buses take the bus lane and left
    /// turners the left-turn lane when there is one, everyone else joins the
    /// shortest lane they are allowed in.
    fn choose_lane(&self, vehicle: &Vehicle) -> Option<usize> {
        let dedicated = if vehicle.is_bus() {
            Some(LaneKind::Bus)
        } else if vehicle.is_turning_left() {
            Some(LaneKind::LeftTurn)
        } else {
            None
        };
        if let Some(kind) = dedicated {
            if let Some(index) = self.lanes.iter().position(|lane| lane.kind() == kind) {
                return Some(index);
            }
        }

        self.lanes
            .iter()
            .enumerate()
            .filter(|(_, lane)| lane.can_enter_lane(vehicle))
            .min_by_key(|(_, lane)| lane.queue_length())
            .map(|(index, _)| index)
    }

    /// Adds a new vehicle behind the last one in its chosen lane
    pub fn create_vehicle(
        &mut self,
        kind: VehicleKind,
        destination: usize,
        speed: f64,
    ) -> Result<(), JunctionError> {
        let mut vehicle = Vehicle::new(kind, speed, self.index, destination, 0.0, self.num_arms);
        let lane_index = self
            .choose_lane(&vehicle)
            .ok_or(JunctionError::UnservedMovement {
                source: self.index,
                destination,
            })?;

        let lane = &mut self.lanes[lane_index];
        let distance = lane.furthest_distance() + SPAWN_GAP;
        if distance > self.length {
            return Err(JunctionError::CapacityExceeded {
                arm: self.index,
                lane: lane_index,
                required_distance: distance,
                arm_length: self.length,
            });
        }

        vehicle.set_distance(distance);
        lane.add_vehicle(vehicle);
        self.arrival_count += 1;
        if kind == VehicleKind::Bus {
            self.bus_arrival_count += 1;
        }
        Ok(())
    }

    /// Moves every lane forward one step, then rebalances the lanes
    pub fn advance(&mut self, step_ms: u64, light: &TrafficLight, conflict_box: &mut ConflictBox) {
        let mut departures = Departures::default();
        for (index, lane) in self.lanes.iter_mut().enumerate() {
            let lane_ref = LaneRef {
                arm: self.index,
                index,
                kind: lane.kind(),
            };
            departures.merge(lane.advance(lane_ref, step_ms, light, conflict_box));
        }
        self.total_wait_ms += departures.total_wait_ms;
        self.vehicle_count += departures.count;
        self.max_wait_ms = self.max_wait_ms.max(departures.max_wait_ms);

        self.handle_lane_switching();

        let longest = self.lanes.iter().map(Lane::max_queue_length).max().unwrap_or(0);
        self.max_queue_length = self.max_queue_length.max(longest);
    }

    /// Moves vehicles into a neighbouring lane whose queue is shorter by at
    /// least [`LANE_SWITCH_MARGIN`]. Switches are collected over the whole arm
    /// and applied afterwards; each lane receives at most one vehicle per step.
    pub fn handle_lane_switching(&mut self) {
        let lane_count = self.lanes.len();
        let mut lengths: Vec<usize> = self.lanes.iter().map(Lane::queue_length).collect();
        let mut claimed = vec![false; lane_count];
        // (source lane, index in source lane, target lane)
        let mut switches: Vec<(usize, usize, usize)> = Vec::new();

        for (from, lane) in self.lanes.iter().enumerate() {
            for (position, vehicle) in lane.vehicles().iter().enumerate() {
                let mut adjacent: Vec<usize> = [from.checked_sub(1), Some(from + 1)]
                    .into_iter()
                    .flatten()
                    .filter(|&to| to < lane_count)
                    .collect();
                adjacent.sort_by_key(|&to| lengths[to]);

                let Some(&to) = adjacent.first() else {
                    continue;
                };
                if claimed[to] || lengths[to] + LANE_SWITCH_MARGIN > lengths[from] {
                    continue;
                }
                let target = &self.lanes[to];
                if !target.can_enter_lane(vehicle) || target.enough_space_to_merge(vehicle).is_none()
                {
                    continue;
                }

                switches.push((from, position, to));
                claimed[to] = true;
                lengths[from] -= 1;
                lengths[to] += 1;
            }
        }

        if switches.is_empty() {
            return;
        }

        // Remove from the back of each lane first so earlier indices stay valid
        switches.sort_by(|a, b| b.1.cmp(&a.1));
        let mut moving = Vec::with_capacity(switches.len());
        for (from, position, to) in switches {
            if let Some(vehicle) = self.lanes[from].remove_at(position) {
                debug!("Arm {}: vehicle switched from lane {from} to lane {to}", self.index);
                moving.push((vehicle, to));
            }
        }
        for (vehicle, to) in moving {
            self.lanes[to].add_vehicle(vehicle);
        }
    }

    /// Current KPIs, folding in vehicles that are still queued
    pub fn kpi(&self) -> ArmKpi {
        let mut total_wait_ms = self.total_wait_ms;
        let mut vehicle_count = self.vehicle_count;
        let mut max_wait_ms = self.max_wait_ms;
        for vehicle in self.lanes.iter().flat_map(Lane::vehicles) {
            total_wait_ms += vehicle.wait_ms();
            vehicle_count += 1;
            max_wait_ms = max_wait_ms.max(vehicle.wait_ms());
        }

        let current_queue = self.lanes.iter().map(Lane::queue_length).max().unwrap_or(0);
        ArmKpi::from_totals(
            total_wait_ms,
            vehicle_count,
            max_wait_ms,
            self.max_queue_length.max(current_queue),
        )
    }
}
