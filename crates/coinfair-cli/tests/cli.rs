use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn coinfair(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("coinfair").expect("binary built");
    cmd.current_dir(dir);
    cmd
}

#[test]
fn posterior_from_counts_prints_map() {
    let dir = tempdir().expect("temp dir");
    coinfair(dir.path())
        .args(["posterior", "--heads", "80", "--tails", "20", "--no-plot"])
        .args(["--run-id", "cli_counts"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "The maximum posterior probability of the fairness of your coin is: F=0.799599",
        ));
    assert!(dir.path().join("out/cli_counts/summary.json").exists());
    assert!(dir.path().join("out/cli_counts/summary.md").exists());
}

#[test]
fn gaussian_prior_pulls_estimate_toward_half() {
    let dir = tempdir().expect("temp dir");
    coinfair(dir.path())
        .args(["posterior", "--heads", "80", "--tails", "20", "--no-plot"])
        .args(["--prior", "gaussian"])
        .assert()
        .success()
        .stdout(predicate::str::contains("F=0.657314"));
}

#[test]
fn raw_outcomes_are_accepted() {
    let dir = tempdir().expect("temp dir");
    coinfair(dir.path())
        .args(["posterior", "--outcomes", "0,0,0,0,0,0,0,0,0,0", "--no-plot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("F=0.000001"));
}

#[test]
fn rejects_non_binary_outcomes() {
    let dir = tempdir().expect("temp dir");
    coinfair(dir.path())
        .args(["posterior", "--outcomes", "1,2", "--no-plot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("toss outcome must be 0 or 1"));
}

#[test]
fn rejects_counts_whose_total_overflows() {
    let dir = tempdir().expect("temp dir");
    coinfair(dir.path())
        .args(["posterior", "--heads", "18446744073709551615", "--tails", "1"])
        .arg("--no-plot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("overflows the toss count"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn rejects_bias_outside_unit_interval() {
    let dir = tempdir().expect("temp dir");
    coinfair(dir.path())
        .args(["simulate", "--pheads", "1.5", "--no-plot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("simulation.pheads"));
}

#[test]
fn seeded_sweep_lists_every_prefix() {
    let dir = tempdir().expect("temp dir");
    coinfair(dir.path())
        .args(["sweep", "--pheads", "0.5", "--max-tosses", "64", "--seed", "11"])
        .args(["--compare-gaussian", "--no-plot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("N=    1:"))
        .stdout(predicate::str::contains("N=   64:"))
        .stdout(predicate::str::contains("gaussian="));
}
