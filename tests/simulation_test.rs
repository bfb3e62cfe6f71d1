use std::process::Command;

fn run_binary(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_junction_sim"))
        .args(args)
        .env("RUST_LOG", "warn,junction_sim=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that a short headless run completes
#[test]
fn test_headless_simulation_runs() {
    let output = run_binary(&["--duration-mins", "2", "--vph", "200", "--seed", "4"]);

    assert!(
        output.status.success(),
        "Simulation failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that per-arm KPIs and the score are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_binary(&[
        "--duration-mins",
        "2",
        "--demand",
        "0,150,150;150,0,150;150,150,0",
        "--lanes",
        "3",
        "--left-turn-lane",
        "--crossing-duration",
        "10",
        "--crossing-frequency",
        "30",
    ]);

    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for arm in 0..3 {
        assert!(
            stderr.contains(&format!("Arm {arm}: average wait")),
            "Missing KPI line for arm {arm}"
        );
    }
    assert!(!stderr.contains("Arm 3:"), "Unexpected fourth arm");
    assert!(stderr.contains("throughput"), "Missing throughput");
    assert!(stderr.contains("Arm 0: arrivals"), "Missing arrival counts");
    assert!(stderr.contains("Efficiency score:"), "Missing efficiency score");
}

/// Test that an impossible lane layout is reported as an error
#[test]
fn test_invalid_layout_fails() {
    let output = run_binary(&["--lanes", "1", "--bus-lane", "--bus-ratio", "0.1"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Insufficient lanes"),
        "Missing lane error. stderr: {}",
        stderr
    );
}

/// Test that a malformed demand matrix is rejected
#[test]
fn test_non_square_demand_fails() {
    let output = run_binary(&["--demand", "0,100;100,0,50"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must be square"), "stderr: {}", stderr);
}
