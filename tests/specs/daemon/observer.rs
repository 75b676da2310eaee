// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observer specs: children never outlive their supervisor.

use std::path::Path;

use crate::prelude::*;
use serial_test::serial;

#[test]
#[serial]
fn failed_supervision_still_stops_children() {
    let env = Env::whitelisted("/bin/cp\n");
    env.append_config(&format!(
        "\n[observer]\ncheck_interval_secs = 1\npidfile_dir = \"{}\"\n",
        env.path().display()
    ));
    // Performers die at startup once their whitelist file is gone; the
    // schedulers keep running.
    std::fs::remove_file(env.path().join("whitelist")).unwrap();

    // Supervise from a copy of the binary so it can disappear while
    // the observer runs: the next performer respawn then fails and
    // supervision ends with an error instead of a crash loop.
    let exe = env.path().join("gantry");
    std::fs::copy(assert_cmd::cargo::cargo_bin("gantry"), &exe).unwrap();

    let mut daemon = env.spawn_observer(&exe);
    std::fs::remove_file(&exe).unwrap();

    assert!(!daemon.wait_exit().success());

    let log = std::fs::read_to_string(env.path().join("observer.log")).unwrap();
    assert!(
        log.contains("stopping daemon"),
        "children must be torn down even when supervision fails:\n{log}"
    );

    let pid = std::fs::read_to_string(env.path().join("serial-scheduler.pid")).unwrap();
    let proc_entry = format!("/proc/{}", pid.trim());
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || !Path::new(&proc_entry).exists()),
        "scheduler must not outlive the observer"
    );
}
