use std::process::Command;

#[test]
fn demo_battle_runs_and_reports() {
    let output = Command::new(env!("CARGO_BIN_EXE_rampart"))
        .args(["--ticks", "200", "--seed", "7"])
        .output()
        .expect("failed to launch rampart");

    assert!(output.status.success(), "rampart exited with {}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Rampart battlefield simulation."));
    assert!(stdout.contains("after 200 ticks"));
    assert!(stdout.contains("attackers:"));
}

#[test]
fn same_seed_prints_the_same_report() {
    let run = || {
        Command::new(env!("CARGO_BIN_EXE_rampart"))
            .args(["--ticks", "120", "--seed", "11"])
            .output()
            .expect("failed to launch rampart")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn unreadable_layout_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_rampart"))
        .args(["--layout", "/nonexistent/layout.txt"])
        .output()
        .expect("failed to launch rampart");
    assert!(!output.status.success());
}
