//! CLI integration tests for the non-interactive run and bench modes.

use std::process::Command;

#[test]
fn run_cli_reports_totals_and_unmatched_players() {
    let bin = env!("CARGO_BIN_EXE_dungeon_queue");
    // 4 tanks + 4 healers + 12 DPS form exactly 4 parties with nobody left
    // over; zero-length runs plus the drain flag keep the test fast.
    let output = Command::new(bin)
        .args(["run", "3", "4", "4", "12", "0", "0", "7", "drain"])
        .output()
        .expect("failed to run binary");

    assert!(
        output.status.success(),
        "run exited with non-zero status: {:?}",
        output.status
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("FINAL STATISTICS"),
        "final statistics missing from output"
    );

    let served_line = stdout
        .lines()
        .find(|line| line.starts_with("total_parties_served="))
        .expect("total_parties_served line missing");
    assert_eq!(served_line.trim(), "total_parties_served=4");

    for line in ["unmatched_tanks=0", "unmatched_healers=0", "unmatched_dps=0"] {
        assert!(
            stdout.lines().any(|out| out.trim() == line),
            "expected {line} in output"
        );
    }
}

#[test]
fn run_cli_reports_leftover_roster() {
    let bin = env!("CARGO_BIN_EXE_dungeon_queue");
    // 5 tanks, 3 healers, 10 DPS -> 3 parties, leaving 2 tanks and 1 DPS.
    let output = Command::new(bin)
        .args(["run", "2", "5", "3", "10", "0", "0", "7", "drain"])
        .output()
        .expect("failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in [
        "total_parties_served=3",
        "unmatched_tanks=2",
        "unmatched_healers=0",
        "unmatched_dps=1",
    ] {
        assert!(
            stdout.lines().any(|out| out.trim() == line),
            "expected {line} in output"
        );
    }
}

#[test]
fn run_cli_rejects_inverted_time_range() {
    let bin = env!("CARGO_BIN_EXE_dungeon_queue");
    let output = Command::new(bin)
        .args(["run", "2", "1", "1", "3", "5", "2"])
        .output()
        .expect("failed to run binary");

    assert!(
        !output.status.success(),
        "inverted time range should be rejected before the simulation starts"
    );
}

#[test]
fn bench_cli_emits_csv_with_full_service() {
    let bin = env!("CARGO_BIN_EXE_dungeon_queue");
    let output = Command::new(bin)
        .args(["bench", "2", "10", "1", "validate"])
        .output()
        .expect("failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // Dev log lines precede the CSV in debug builds; locate the header.
    let mut lines = stdout
        .lines()
        .skip_while(|line| !line.starts_with("instances,parties,work_ms,total_served"));
    lines.next().expect("csv header missing");
    let row = lines.next().expect("csv row missing");
    assert!(
        row.starts_with("2,10,1,10,"),
        "expected full service in csv row, got: {row}"
    );

    // Validation output goes to stderr only when a property is violated.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("violation"),
        "unexpected validation failure: {stderr}"
    );
}
