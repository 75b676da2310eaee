// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enqueue specs: inserting job groups from the command line.

use crate::prelude::*;

#[test]
fn enqueue_prints_ascending_group_ids() {
    let env = Env::new();
    let first = env.enqueue("serial", "one", &["name=a,action=/bin/true"]);
    let second = env.enqueue("serial", "two", &["name=b,action=/bin/true"]);

    let first: u64 = first.parse().unwrap();
    let second: u64 = second.parse().unwrap();
    assert!(second > first, "ids must ascend with insertion order");
}

#[test]
fn enqueue_accepts_rollback_and_finish() {
    let env = Env::new();
    env.gantry()
        .args([
            "enqueue",
            "--name",
            "deploy",
            "--mode",
            "parallel",
            "--finish",
            "/bin/echo done",
            "--job",
            "name=make,action=/bin/touch /tmp/a,rollback=/bin/rm /tmp/a",
            "--job",
            "name=copy,action=/bin/cp /tmp/a /tmp/b",
        ])
        .assert()
        .success();
}

#[test]
fn enqueue_requires_at_least_one_job() {
    let env = Env::new();
    env.gantry()
        .args(["enqueue", "--name", "empty"])
        .assert()
        .failure();
}

#[test]
fn malformed_job_spec_is_rejected() {
    let env = Env::new();
    env.gantry()
        .args(["enqueue", "--name", "bad", "--job", "action-only=/bin/true"])
        .assert()
        .failure()
        .stderr_has("name=");
}
