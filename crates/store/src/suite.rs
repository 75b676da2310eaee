// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract checks run against every [`JobStore`] implementation.

use gantry_core::{GroupKind, GroupStatus, JobStatus, NewGroup, NewJob};

use crate::JobStore;

const KEY: &str = "b6a04fa6-1f27-4746-a4a7-b5dd0c38a3d8";

fn two_job_group(name: &str, kind: GroupKind) -> NewGroup {
    NewGroup {
        name: name.to_string(),
        uniq_key: KEY.to_string(),
        kind,
        finish_command: None,
        jobs: vec![
            NewJob::new("make", "/bin/touch /tmp/a").with_rollback("/bin/rm /tmp/a"),
            NewJob::new("copy", "/bin/cp /tmp/a /tmp/b"),
        ],
    }
}

pub(crate) fn insert_and_find(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g1", GroupKind::Serial)).unwrap();

    let group = store.find_group(id, KEY).unwrap().unwrap();
    assert_eq!(group.id, id);
    assert_eq!(group.name, "g1");
    assert_eq!(group.status, GroupStatus::Pending);
    assert_eq!(group.kind, GroupKind::Serial);

    // A mismatched key sees nothing.
    assert!(store.find_group(id, "other-key").unwrap().is_none());
}

pub(crate) fn dispatch_order_and_limit(store: &dyn JobStore) {
    let a = store.insert_group(&two_job_group("a", GroupKind::Serial)).unwrap();
    let b = store.insert_group(&two_job_group("b", GroupKind::Serial)).unwrap();
    let c = store.insert_group(&two_job_group("c", GroupKind::Parallel)).unwrap();

    let pending = store
        .groups_by_kind_status(GroupKind::Serial, GroupStatus::Pending, None)
        .unwrap();
    assert_eq!(pending.iter().map(|g| g.id).collect::<Vec<_>>(), vec![a, b]);

    let limited = store
        .groups_by_kind_status(GroupKind::Serial, GroupStatus::Pending, Some(1))
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, a);

    let parallel = store
        .groups_by_kind_status(GroupKind::Parallel, GroupStatus::Pending, None)
        .unwrap();
    assert_eq!(parallel.iter().map(|g| g.id).collect::<Vec<_>>(), vec![c]);
}

pub(crate) fn claim_is_exclusive(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g", GroupKind::Parallel)).unwrap();

    assert!(store.claim_group(id, KEY).unwrap());
    // Second claim loses: the group is already running.
    assert!(!store.claim_group(id, KEY).unwrap());

    let group = store.find_group(id, KEY).unwrap().unwrap();
    assert_eq!(group.status, GroupStatus::Running);
}

pub(crate) fn claim_checks_key(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g", GroupKind::Serial)).unwrap();
    assert!(!store.claim_group(id, "not-our-key").unwrap());

    let group = store.find_group(id, KEY).unwrap().unwrap();
    assert_eq!(group.status, GroupStatus::Pending);
}

pub(crate) fn delete_cascades_to_jobs(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g", GroupKind::Serial)).unwrap();
    assert_eq!(store.jobs_by_group(id, false).unwrap().len(), 2);

    store.delete_group(id).unwrap();
    assert!(store.find_group(id, KEY).unwrap().is_none());
    assert!(store.jobs_by_group(id, false).unwrap().is_empty());
}

pub(crate) fn jobs_ordered_both_ways(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g", GroupKind::Serial)).unwrap();

    let asc = store.jobs_by_group(id, false).unwrap();
    assert_eq!(
        asc.iter().map(|j| j.name.as_str()).collect::<Vec<_>>(),
        vec!["make", "copy"]
    );
    assert_eq!(asc[0].order, 0);
    assert_eq!(asc[1].order, 1);

    let desc = store.jobs_by_group(id, true).unwrap();
    assert_eq!(
        desc.iter().map(|j| j.name.as_str()).collect::<Vec<_>>(),
        vec!["copy", "make"]
    );
}

pub(crate) fn job_results_round_trip(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g", GroupKind::Serial)).unwrap();
    let job = store.jobs_by_group(id, false).unwrap().remove(0);

    store.update_job_status(job.id, JobStatus::Running).unwrap();
    store.record_action_result(job.id, Some(0), "done\n", "").unwrap();
    store.update_job_status(job.id, JobStatus::Ok).unwrap();

    let job = store.jobs_by_group(id, false).unwrap().remove(0);
    assert_eq!(job.status, JobStatus::Ok);
    assert_eq!(job.action_exit_code, Some(0));
    assert_eq!(job.action_stdout.as_deref(), Some("done\n"));
    assert_eq!(job.action_stderr.as_deref(), Some(""));
    assert_eq!(job.rollback_exit_code, None);

    store.record_rollback_result(job.id, Some(1), "", "undo failed\n").unwrap();
    let job = store.jobs_by_group(id, false).unwrap().remove(0);
    assert_eq!(job.rollback_exit_code, Some(1));
    assert_eq!(job.rollback_stderr.as_deref(), Some("undo failed\n"));
}

pub(crate) fn rejected_job_has_no_exit_code(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g", GroupKind::Serial)).unwrap();
    let job = store.jobs_by_group(id, false).unwrap().remove(0);

    store.update_job_status(job.id, JobStatus::WhitelistReject).unwrap();
    store
        .record_action_result(job.id, None, "", "command not whitelisted\n")
        .unwrap();

    let job = store.jobs_by_group(id, false).unwrap().remove(0);
    assert_eq!(job.status, JobStatus::WhitelistReject);
    assert_eq!(job.action_exit_code, None);
    assert_eq!(job.action_stderr.as_deref(), Some("command not whitelisted\n"));
}

pub(crate) fn progress_clamps_at_hundred(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g", GroupKind::Serial)).unwrap();
    let job = store.jobs_by_group(id, false).unwrap().remove(0);

    assert_eq!(store.progress(job.id).unwrap(), Some(0));
    assert_eq!(store.increment_progress(job.id, 40).unwrap(), Some(40));
    assert_eq!(store.increment_progress(job.id, 40).unwrap(), Some(80));
    assert_eq!(store.increment_progress(job.id, 40).unwrap(), Some(100));
    assert_eq!(store.progress(job.id).unwrap(), Some(100));
}

pub(crate) fn progress_unknown_job(store: &dyn JobStore) {
    assert_eq!(store.progress(gantry_core::JobId(999)).unwrap(), None);
    assert_eq!(store.increment_progress(gantry_core::JobId(999), 10).unwrap(), None);
}

pub(crate) fn group_status_updates(store: &dyn JobStore) {
    let id = store.insert_group(&two_job_group("g", GroupKind::Serial)).unwrap();

    store.update_group_status(id, GroupStatus::Running).unwrap();
    assert_eq!(
        store.find_group(id, KEY).unwrap().unwrap().status,
        GroupStatus::Running
    );

    store.update_group_status(id, GroupStatus::Abnormal).unwrap();
    let group = store.find_group(id, KEY).unwrap().unwrap();
    assert_eq!(group.status, GroupStatus::Abnormal);
    assert!(group.status.is_terminal());
}
