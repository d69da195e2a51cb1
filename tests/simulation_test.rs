use std::io::Write;
use std::process::{Command, Stdio};

use cellular_traffic::service::Response;

const BIN: &str = env!("CARGO_BIN_EXE_cellular_traffic");

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = Command::new(BIN)
        .args(["--headless", "--ticks", "200", "--seed", "7"])
        .env("RUST_LOG", "warn,cellular_traffic=info")
        .output()
        .expect("Failed to execute simulation");

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that the headless summary reports the traffic statistics
#[test]
fn test_simulation_statistics_logged() {
    let output = Command::new(BIN)
        .args(["--headless", "--ticks", "100", "--seed", "3"])
        .env("RUST_LOG", "warn,cellular_traffic=info")
        .output()
        .expect("Failed to execute simulation");

    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for label in ["Tick:", "Vehicles:", "Mean speed:", "Stopped vehicles:", "Density:"] {
        assert!(stderr.contains(label), "Missing '{}' statistic", label);
    }

    // The last summary is the final state
    let vehicles_line = stderr
        .lines()
        .filter(|line| line.contains("Vehicles:"))
        .last()
        .expect("Could not find 'Vehicles' line");
    let parts: Vec<&str> = vehicles_line.split("Vehicles:").collect();
    let vehicles: u32 = parts
        .get(1)
        .and_then(|s| s.trim().parse().ok())
        .expect("Could not parse vehicle count");
    assert!(vehicles > 0, "No vehicles were placed by the default scenario");

    let tick_line = stderr
        .lines()
        .filter(|line| line.contains("Tick:"))
        .last()
        .expect("Could not find 'Tick' line");
    assert!(tick_line.trim_end().ends_with("Tick: 100"), "{}", tick_line);
}

/// Test the stdin/stdout request protocol end to end
#[test]
fn test_stdin_protocol_round_trip() {
    let mut child = Command::new(BIN)
        .args(["--seed", "5"])
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to start service");

    {
        let stdin = child.stdin.as_mut().expect("stdin is piped");
        let requests = [
            r#"{"op": "init", "dolzina_ceste": 100, "st_pasov": 1, "p_zaviranje": 0}"#,
            r#"{"op": "add_obstacle", "poz": 50, "pas": 0}"#,
            r#"{"op": "add_vozilo", "poz": 50, "pas": 0, "max_hitrost": 5}"#,
            r#"{"op": "add_vozilo", "poz": 8, "pas": 0, "max_hitrost": 3}"#,
            r#"{"op": "add_vozilo", "poz": 6, "pas": 0, "max_hitrost": 10}"#,
            r#"{"op": "step", "n": 1}"#,
        ];
        for request in requests {
            writeln!(stdin, "{}", request).expect("Failed to write request");
        }
    }
    drop(child.stdin.take());

    let output = child.wait_with_output().expect("Service did not exit");
    assert!(output.status.success());

    let responses: Vec<Response> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("response is JSON"))
        .collect();
    assert_eq!(responses.len(), 6);
    assert_eq!(responses[2].kind.as_deref(), Some("occupied_cell"));

    let state = responses[5].state.as_ref().expect("step returns state");
    let positions: Vec<(usize, usize)> = state
        .vehicles
        .iter()
        .map(|v| (v.position, v.speed))
        .collect();
    assert_eq!(positions, vec![(9, 1), (7, 1)]);
}
