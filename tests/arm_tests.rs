//! Arm construction, arrivals, lane balancing and KPI tests

use assert_approx_eq::assert_approx_eq;
use junction_sim::simulation::{
    Arm, ConflictBox, JunctionConfig, JunctionError, Lane, LaneKind, TrafficLight, Vehicle,
    VehicleKind, SPAWN_GAP,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn two_lane_arm() -> Arm {
    Arm::with_lanes(
        0,
        4,
        500.0,
        vec![
            Lane::ordinary(vec![1, 2, 3], 3.0),
            Lane::ordinary(vec![1, 2, 3], 3.0),
        ],
    )
}

fn parked_car(distance: f64) -> Vehicle {
    Vehicle::car(0.0, 0, 2, distance, 4)
}

fn lane_distances(arm: &Arm, lane: usize) -> Vec<f64> {
    arm.lane(lane)
        .unwrap()
        .vehicles()
        .iter()
        .map(Vehicle::distance)
        .collect()
}

#[test]
fn test_insufficient_lanes() {
    let config = JunctionConfig::uniform(4, 100.0)
        .with_lanes(2)
        .with_bus_lane(0.1)
        .with_left_turn_lane();

    assert_eq!(
        Arm::new(0, &config).unwrap_err(),
        JunctionError::InsufficientLanes {
            requested: 2,
            reserved: 2
        }
    );
}

#[test]
fn test_lane_layout_order() {
    let config = JunctionConfig::uniform(4, 100.0)
        .with_lanes(4)
        .with_bus_lane(0.1)
        .with_left_turn_lane();
    let arm = Arm::new(0, &config).unwrap();

    let kinds: Vec<LaneKind> = arm.lanes().iter().map(Lane::kind).collect();
    assert_eq!(
        kinds,
        vec![
            LaneKind::Bus,
            LaneKind::LeftTurn,
            LaneKind::Ordinary,
            LaneKind::Ordinary
        ]
    );
    assert_eq!(arm.lanes()[1].directions(), &[3]);
    assert_eq!(arm.lanes()[2].directions(), &[1, 2, 3]);
    assert_approx_eq!(arm.width(), 12.0);
}

#[test]
fn test_explicit_lane_directions_override_defaults() {
    let config = JunctionConfig::uniform(4, 100.0)
        .with_lanes(3)
        .with_lane_directions(vec![vec![1, 2]]);
    let arm = Arm::new(0, &config).unwrap();

    assert_eq!(arm.lanes()[0].directions(), &[1, 2]);
    assert_eq!(arm.lanes()[1].directions(), &[1, 2, 3]);
    assert_eq!(arm.lanes()[2].directions(), &[1, 2, 3]);
}

#[test]
fn test_arrivals_join_shortest_lane() {
    let config = JunctionConfig::uniform(4, 100.0).with_lanes(2);
    let mut arm = Arm::new(0, &config).unwrap();

    for _ in 0..3 {
        arm.create_vehicle(VehicleKind::Car, 2, 10.0).unwrap();
    }

    assert_eq!(lane_distances(&arm, 0), vec![SPAWN_GAP, SPAWN_GAP * 2.0]);
    assert_eq!(lane_distances(&arm, 1), vec![SPAWN_GAP]);
    assert!(arm.has_vehicle_within(100.0));
    assert_approx_eq!(arm.nearest_vehicle_distance().unwrap(), SPAWN_GAP);
}

#[test]
fn test_buses_and_left_turners_use_dedicated_lanes() {
    let config = JunctionConfig::uniform(4, 100.0)
        .with_lanes(3)
        .with_bus_lane(0.5)
        .with_left_turn_lane();
    let mut arm = Arm::new(0, &config).unwrap();

    arm.create_vehicle(VehicleKind::Bus, 2, 10.0).unwrap();
    arm.create_vehicle(VehicleKind::Car, 1, 10.0).unwrap();
    arm.create_vehicle(VehicleKind::Car, 2, 10.0).unwrap();

    assert!(arm.lanes()[0].head().unwrap().is_bus());
    assert!(arm.lanes()[1].head().unwrap().is_turning_left());
    assert_eq!(arm.lanes()[2].head().unwrap().destination(), 2);
}

#[test]
fn test_capacity_exceeded() {
    let config = JunctionConfig::uniform(4, 100.0)
        .with_lanes(1)
        .with_geometry(3.0, 40.0);
    let mut arm = Arm::new(0, &config).unwrap();

    arm.create_vehicle(VehicleKind::Car, 2, 10.0).unwrap();
    arm.create_vehicle(VehicleKind::Car, 2, 10.0).unwrap();
    let err = arm.create_vehicle(VehicleKind::Car, 2, 10.0).unwrap_err();

    match err {
        JunctionError::CapacityExceeded {
            arm,
            lane,
            required_distance,
            arm_length,
        } => {
            assert_eq!(arm, 0);
            assert_eq!(lane, 0);
            assert_approx_eq!(required_distance, 45.0);
            assert_approx_eq!(arm_length, 40.0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unserved_movement_on_arrival() {
    let config = JunctionConfig::uniform(4, 0.0)
        .with_lanes(1)
        .with_lane_directions(vec![vec![1]]);
    let mut arm = Arm::new(0, &config).unwrap();

    assert_eq!(
        arm.create_vehicle(VehicleKind::Car, 2, 10.0),
        Err(JunctionError::UnservedMovement {
            source: 0,
            destination: 2
        })
    );
}

#[test]
fn test_lane_switching_one_vehicle_per_target_lane() {
    let mut arm = two_lane_arm();
    for distance in [10.0, 30.0, 50.0, 70.0] {
        arm.lane_mut(0).unwrap().add_vehicle(parked_car(distance));
    }

    arm.handle_lane_switching();
    assert_eq!(lane_distances(&arm, 0), vec![30.0, 50.0, 70.0]);
    assert_eq!(lane_distances(&arm, 1), vec![10.0]);

    arm.handle_lane_switching();
    assert_eq!(lane_distances(&arm, 0), vec![50.0, 70.0]);
    assert_eq!(lane_distances(&arm, 1), vec![10.0, 30.0]);

    // Queues now differ by less than two vehicles
    arm.handle_lane_switching();
    assert_eq!(lane_distances(&arm, 0), vec![50.0, 70.0]);
    assert_eq!(lane_distances(&arm, 1), vec![10.0, 30.0]);
}

#[test]
fn test_lane_switching_respects_directions() {
    let mut arm = Arm::with_lanes(
        0,
        4,
        500.0,
        vec![
            Lane::ordinary(vec![1, 2, 3], 3.0),
            Lane::ordinary(vec![1], 3.0),
        ],
    );
    for distance in [10.0, 30.0, 50.0] {
        arm.lane_mut(0).unwrap().add_vehicle(parked_car(distance));
    }

    arm.handle_lane_switching();
    assert_eq!(arm.lanes()[0].queue_length(), 3);
    assert!(arm.lanes()[1].is_empty());
}

#[test]
fn test_lane_switching_needs_room_to_merge() {
    let mut arm = two_lane_arm();
    for distance in [10.0, 30.0, 50.0] {
        arm.lane_mut(0).unwrap().add_vehicle(parked_car(distance));
    }
    // Blocks the 10m slot in the target lane
    arm.lane_mut(1).unwrap().add_vehicle(parked_car(8.0));

    arm.handle_lane_switching();
    assert_eq!(lane_distances(&arm, 0), vec![10.0, 50.0]);
    assert_eq!(lane_distances(&arm, 1), vec![8.0, 30.0]);
}

#[test]
fn test_kpi_includes_queued_vehicles() {
    let mut arm = two_lane_arm();
    let mut first = parked_car(10.0);
    first.add_wait(1_000);
    let mut second = parked_car(30.0);
    second.add_wait(3_006);
    arm.lane_mut(0).unwrap().add_vehicle(first);
    arm.lane_mut(0).unwrap().add_vehicle(second);

    let kpi = arm.kpi();
    assert_approx_eq!(kpi.average_wait_s, 2.0);
    assert_approx_eq!(kpi.max_wait_s, 3.01);
    assert_eq!(kpi.max_queue_length, 2);
}

#[test]
fn test_held_vehicles_accrue_wait_on_red() {
    let mut rng = StdRng::seed_from_u64(5);
    let light = TrafficLight::new(4, 20_000, 5_000, None, &mut rng);
    let mut conflict_box = ConflictBox::new(12.0, 4);
    let mut arm = Arm::with_lanes(
        1,
        4,
        500.0,
        vec![Lane::ordinary(vec![1, 2, 3], 3.0)],
    );
    arm.lane_mut(0)
        .unwrap()
        .add_vehicle(Vehicle::car(10.0, 1, 3, 0.5, 4));

    for _ in 0..10 {
        arm.advance(100, &light, &mut conflict_box);
    }

    assert!(conflict_box.vehicles().is_empty());
    assert_eq!(arm.vehicle_count(), 0);
    let kpi = arm.kpi();
    assert_approx_eq!(kpi.average_wait_s, 1.0);
    assert_approx_eq!(kpi.max_wait_s, 1.0);
    assert_eq!(kpi.max_queue_length, 1);
}

#[test]
fn test_departures_fold_into_kpi() {
    let mut rng = StdRng::seed_from_u64(5);
    let light = TrafficLight::new(4, 20_000, 5_000, None, &mut rng);
    let mut conflict_box = ConflictBox::new(12.0, 4);
    let mut arm = Arm::with_lanes(
        0,
        4,
        500.0,
        vec![Lane::ordinary(vec![1, 2, 3], 3.0)],
    );
    let mut waited = Vehicle::car(10.0, 0, 2, 0.5, 4);
    waited.add_wait(4_000);
    arm.lane_mut(0).unwrap().add_vehicle(waited);

    arm.advance(100, &light, &mut conflict_box);

    assert_eq!(arm.vehicle_count(), 1);
    assert!(arm.lanes()[0].is_empty());
    assert_eq!(conflict_box.vehicles().len(), 1);
    let kpi = arm.kpi();
    assert_approx_eq!(kpi.average_wait_s, 4.0);
    assert_approx_eq!(kpi.max_wait_s, 4.0);
    assert_eq!(kpi.max_queue_length, 1);
}
