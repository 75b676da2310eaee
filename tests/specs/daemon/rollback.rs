// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rollback specs: a failed group compensates completed work.

use crate::prelude::*;
use serial_test::serial;

#[test]
#[serial]
fn failed_group_rolls_back_completed_jobs() {
    let env = Env::new();
    let artifact = env.path().join("artifact");
    env.enqueue(
        "serial",
        "doomed",
        &[
            &format!(
                "name=make,action=/bin/touch {a},rollback=/bin/rm {a}",
                a = artifact.display()
            ),
            "name=explode,action=/bin/false",
        ],
    );

    let mut daemon = env.spawn_performer("serial");
    env.send_code("serial", START_CODE);
    env.send_code("serial", STOP_CODE);
    assert!(daemon.wait_exit().success());

    // The first job created the artifact; its rollback removed it.
    assert!(!artifact.exists(), "rollback should have removed the artifact");
}

#[test]
#[serial]
fn successful_group_does_not_roll_back() {
    let env = Env::new();
    let artifact = env.path().join("artifact");
    env.enqueue(
        "serial",
        "fine",
        &[&format!(
            "name=make,action=/bin/touch {a},rollback=/bin/rm {a}",
            a = artifact.display()
        )],
    );

    let mut daemon = env.spawn_performer("serial");
    env.send_code("serial", START_CODE);
    env.send_code("serial", STOP_CODE);
    assert!(daemon.wait_exit().success());

    assert!(artifact.exists(), "successful group must keep its work");
}

#[test]
#[serial]
fn jobs_after_the_failure_never_run() {
    let env = Env::new();
    let never = env.path().join("never");
    env.enqueue(
        "serial",
        "stops-early",
        &[
            "name=explode,action=/bin/false",
            &format!("name=after,action=/bin/touch {}", never.display()),
        ],
    );

    let mut daemon = env.spawn_performer("serial");
    env.send_code("serial", START_CODE);
    env.send_code("serial", STOP_CODE);
    assert!(daemon.wait_exit().success());

    assert!(!never.exists(), "no skip-forward past a failed job");
}

#[test]
#[serial]
fn finish_command_runs_even_after_failure() {
    let env = Env::new();
    let finished = env.path().join("finished");
    env.gantry()
        .args([
            "enqueue",
            "--name",
            "hooked",
            "--finish",
            &format!("/bin/touch {}", finished.display()),
            "--job",
            "name=explode,action=/bin/false",
        ])
        .assert()
        .success();

    let mut daemon = env.spawn_performer("serial");
    env.send_code("serial", START_CODE);
    env.send_code("serial", STOP_CODE);
    assert!(daemon.wait_exit().success());

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || finished.exists()),
        "finish hook must run regardless of outcome"
    );
}
