//! The conflict zone in the middle of the junction
//!
//! Vehicles that have crossed their stop line are owned by the box until they
//! have driven its full length. The box also decides whether a waiting vehicle
//! may enter without crossing the path of one already inside.

use log::debug;

use super::traffic_light::TrafficLight;
use super::types::{left_arm, LaneKind, LaneRef};
use super::vehicle::Vehicle;

/// The shared interior of the junction
#[derive(Debug, Clone)]
pub struct ConflictBox {
    /// Vehicles currently crossing, in entry order
    vehicles: Vec<Vehicle>,
    /// Length a vehicle must travel to clear the box, in metres
    size: f64,
    /// Vehicles that fully crossed, per origin arm
    arm_throughputs: Vec<u64>,
}

impl ConflictBox {
    pub fn new(size: f64, num_arms: usize) -> Self {
        Self {
            vehicles: Vec::new(),
            size,
            arm_throughputs: vec![0; num_arms],
        }
    }

    /// Sizes the box to fit the widest approach: lane width times lane count, both ways
    pub fn from_geometry(lane_width: f64, max_lane_count: usize, num_arms: usize) -> Self {
        Self::new(lane_width * max_lane_count as f64 * 2.0, num_arms)
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn arm_throughputs(&self) -> &[u64] {
        &self.arm_throughputs
    }

    /// Takes ownership of a vehicle that just crossed its stop line.
    /// Its distance becomes the remaining length of box to clear.
    pub fn add_vehicle(&mut self, mut vehicle: Vehicle) {
        vehicle.set_distance(self.size + vehicle.distance());
        self.vehicles.push(vehicle);
    }

    /// Moves every vehicle through the box and retires the ones that have left it
    pub fn advance(&mut self, step_ms: u64) {
        for vehicle in &mut self.vehicles {
            vehicle.set_distance(vehicle.next_distance(step_ms));
        }

        let throughputs = &mut self.arm_throughputs;
        self.vehicles.retain(|vehicle| {
            if vehicle.distance() > 0.0 {
                return true;
            }
            if let Some(count) = throughputs.get_mut(vehicle.source()) {
                *count += 1;
            }
            debug!(
                "Vehicle from arm {} to arm {} cleared the box",
                vehicle.source(),
                vehicle.destination()
            );
            false
        });
    }

    /// Whether `vehicle`, waiting at the head of `lane`, may enter the box this step
    pub fn can_enter_box(&self, vehicle: &Vehicle, lane: LaneRef, light: &TrafficLight) -> bool {
        match lane.kind {
            LaneKind::Ordinary | LaneKind::Bus => self.can_enter_on_green(vehicle, lane, light),
            LaneKind::LeftTurn => self.can_filter_left(vehicle, light),
        }
    }

    /// Ordinary right-of-way: the arm must have the green, and no vehicle from
    /// the same arm may already be on a crossing path inside the box.
    fn can_enter_on_green(&self, vehicle: &Vehicle, lane: LaneRef, light: &TrafficLight) -> bool {
        if light.crossing_active() || light.green_arm() != Some(lane.arm) {
            return false;
        }

        let direction = vehicle.relative_direction();
        !self
            .vehicles
            .iter()
            .filter(|other| other.source() == vehicle.source())
            .any(|other| {
                let Some(other_lane) = other.source_lane() else {
                    return false;
                };
                let other_direction = other.relative_direction();
                (lane.index < other_lane && other_direction < direction)
                    || (lane.index > other_lane && other_direction > direction)
            })
    }

    /// Left-turn lanes filter regardless of their own signal, giving way only
    /// to a pedestrian crossing and to vehicles from other arms converging on
    /// the same exit.
    fn can_filter_left(&self, vehicle: &Vehicle, light: &TrafficLight) -> bool {
        if light.crossing_active() {
            return false;
        }
        if light.green_arm() == Some(left_arm(vehicle.source(), light.num_arms())) {
            return true;
        }
        !self.vehicles.iter().any(|other| {
            other.destination() == vehicle.destination() && other.source() != vehicle.source()
        })
    }
}
