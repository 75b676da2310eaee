// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress API specs: the cooperating-client protocol over
//! GANTRY_JOB_ID.

use crate::prelude::*;

#[test]
fn get_without_job_context_prints_minus_one() {
    let env = Env::new();
    env.gantry()
        .args(["progress", "get"])
        .env_remove("GANTRY_JOB_ID")
        .assert()
        .success()
        .stdout_has("-1");
}

#[test]
fn up_clamps_at_one_hundred() {
    let env = Env::new();
    env.enqueue("serial", "tracked", &["name=step,action=/bin/true"]);

    // First group, first job: the store assigns id 1.
    let job_id = "1";
    env.gantry()
        .args(["progress", "get"])
        .env("GANTRY_JOB_ID", job_id)
        .assert()
        .success()
        .stdout_has("0");
    env.gantry()
        .args(["progress", "up", "60"])
        .env("GANTRY_JOB_ID", job_id)
        .assert()
        .success()
        .stdout_has("60");
    env.gantry()
        .args(["progress", "up", "60"])
        .env("GANTRY_JOB_ID", job_id)
        .assert()
        .success()
        .stdout_has("100");
    env.gantry()
        .args(["progress", "get"])
        .env("GANTRY_JOB_ID", job_id)
        .assert()
        .success()
        .stdout_has("100");
}

#[test]
fn unknown_job_id_prints_minus_one() {
    let env = Env::new();
    env.gantry()
        .args(["progress", "get"])
        .env("GANTRY_JOB_ID", "999")
        .assert()
        .success()
        .stdout_has("-1");
}
