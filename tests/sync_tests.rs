// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde_json::{Map, Value, json};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tallybook::db::Store;
use tallybook::error::SyncError;
use tallybook::ledger::{DATA_KEY, Ledger};
use tallybook::models::{EntryType, NewTransaction};
use tallybook::sync::{
    LAST_SYNC_KEY, SyncCoordinator, SyncOptions, SyncState, SyncStatus, TOKEN_KEY, Transports,
    USER_ID_KEY, adopt_identity, ensure_identity, forget_remote, set_token, sync_info,
};
use tallybook::transport::{GIST_ID_KEY, PASTE_URL_KEY, RemoteTransport, SyncPayload};
use tallybook::utils::today;
use tallybook::{cli, commands};

/// In-memory blob store shared between simulated devices.
#[derive(Clone, Default)]
struct MemoryTransport {
    blobs: Rc<RefCell<HashMap<String, SyncPayload>>>,
    next_id: Rc<Cell<u32>>,
    fail: Rc<Cell<bool>>,
    key: &'static str,
}

impl MemoryTransport {
    fn gist() -> Self {
        Self {
            key: GIST_ID_KEY,
            ..Default::default()
        }
    }

    fn paste() -> Self {
        Self {
            key: PASTE_URL_KEY,
            ..Default::default()
        }
    }
}

impl RemoteTransport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn resource_key(&self) -> &'static str {
        self.key
    }

    fn create_or_update(
        &self,
        resource_id: Option<&str>,
        payload: &SyncPayload,
    ) -> Result<String, SyncError> {
        if self.fail.get() {
            return Err(SyncError::Status(503));
        }
        let id = match resource_id {
            Some(id) => id.to_string(),
            None => {
                self.next_id.set(self.next_id.get() + 1);
                format!("blob-{}", self.next_id.get())
            }
        };
        self.blobs.borrow_mut().insert(id.clone(), payload.clone());
        Ok(id)
    }

    fn read(&self, resource_id: &str) -> Result<SyncPayload, SyncError> {
        if self.fail.get() {
            return Err(SyncError::Status(503));
        }
        self.blobs
            .borrow()
            .get(resource_id)
            .cloned()
            .ok_or(SyncError::Status(404))
    }
}

fn instant() -> SyncOptions {
    SyncOptions {
        push_interval: Duration::ZERO,
        pull_delay: Duration::ZERO,
        reload_delay: Duration::ZERO,
    }
}

fn device() -> Ledger {
    Ledger::open(Store::open_in_memory().unwrap()).unwrap()
}

fn authenticated(t: &MemoryTransport) -> Transports {
    Transports {
        authenticated: Some(Box::new(t.clone())),
        anonymous: None,
    }
}

fn run(ledger: &Ledger, sync: &mut SyncCoordinator<'_>, args: &[&str]) {
    let mut argv = vec!["tallybook", "sync"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("sync", sub)) => commands::sync::handle(ledger, sync, sub).unwrap(),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

fn spend(l: &Ledger, amount: i64) {
    l.add_transaction(NewTransaction {
        r#type: EntryType::Expense,
        amount: Decimal::new(amount, 0),
        description: format!("spent {}", amount),
        category_id: Some(8),
        date: today(),
        notes: None,
    })
    .unwrap();
}

#[test]
fn identity_is_created_once_and_reused() {
    let l = device();
    let id = ensure_identity(&l).unwrap();
    assert!(id.starts_with("user_"));
    let parts: Vec<&str> = id.split('_').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[2].len(), 9);
    assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    assert_eq!(ensure_identity(&l).unwrap(), id);
    let raw = l.store().get(USER_ID_KEY).unwrap().unwrap();
    assert_eq!(raw, format!("\"{}\"", id));
}

#[test]
fn local_changes_coalesce_into_one_push() {
    let l = device();
    let remote = MemoryTransport::gist();
    let mut sync = SyncCoordinator::new(&l, authenticated(&remote), instant()).unwrap();
    let statuses = sync.subscribe_status();
    assert_eq!(sync.state(), SyncState::Idle);

    spend(&l, 1);
    spend(&l, 2);
    spend(&l, 3);
    assert_eq!(sync.poll_events(), SyncState::PushPending);

    let status = sync.flush().unwrap();
    assert!(matches!(status, SyncStatus::Pushed { .. }));
    assert_eq!(sync.state(), SyncState::Idle);
    assert!(sync.flush().is_none());
    assert_eq!(statuses.try_iter().count(), 1);

    assert_eq!(remote.blobs.borrow().len(), 1);
    assert_eq!(l.store().get(GIST_ID_KEY).unwrap().as_deref(), Some("blob-1"));
    assert!(l.store().get(LAST_SYNC_KEY).unwrap().is_some());
}

#[test]
fn pushed_payload_carries_only_namespaced_keys() {
    let l = device();
    l.store().set(TOKEN_KEY, "ghp_secret").unwrap();
    let remote = MemoryTransport::gist();
    let mut sync = SyncCoordinator::new(&l, authenticated(&remote), instant()).unwrap();
    spend(&l, 10);
    sync.push();

    let blobs = remote.blobs.borrow();
    let payload = blobs.get("blob-1").unwrap();
    assert_eq!(payload.user_id, sync.user_id());
    let mut keys: Vec<&String> = payload.data.keys().collect();
    keys.sort();
    assert_eq!(keys, vec![DATA_KEY, USER_ID_KEY]);
    assert!(payload.data[DATA_KEY]["_timestamp"].is_number());
    assert_eq!(payload.data[DATA_KEY]["transactions"][0]["amount"], json!(10.0));
    assert!(payload.device.starts_with("tallybook/"));
    assert!(!payload.timestamp.is_empty());
}

#[test]
fn second_push_updates_the_same_resource() {
    let l = device();
    let remote = MemoryTransport::gist();
    let mut sync = SyncCoordinator::new(&l, authenticated(&remote), instant()).unwrap();
    spend(&l, 1);
    sync.flush();
    spend(&l, 2);
    sync.flush();
    assert_eq!(remote.blobs.borrow().len(), 1);
    let blobs = remote.blobs.borrow();
    let txs = blobs["blob-1"].data[DATA_KEY]["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 2);
}

#[test]
fn push_failure_is_reported_not_raised() {
    let l = device();
    let remote = MemoryTransport::gist();
    remote.fail.set(true);
    let mut sync = SyncCoordinator::new(&l, authenticated(&remote), instant()).unwrap();
    spend(&l, 5);
    let status = sync.flush().unwrap();
    assert!(matches!(status, SyncStatus::PushFailed { .. }));
    assert!(l.store().get(LAST_SYNC_KEY).unwrap().is_none());
    assert_eq!(l.transactions().unwrap().len(), 1);
    assert_eq!(sync.state(), SyncState::Idle);
}

#[test]
fn anonymous_transport_is_used_without_a_token() {
    let l = device();
    let paste = MemoryTransport::paste();
    let transports = Transports {
        authenticated: None,
        anonymous: Some(Box::new(paste.clone())),
    };
    let mut sync = SyncCoordinator::new(&l, transports, instant()).unwrap();
    spend(&l, 7);
    assert!(matches!(sync.flush(), Some(SyncStatus::Pushed { .. })));
    assert_eq!(l.store().get(PASTE_URL_KEY).unwrap().as_deref(), Some("blob-1"));
    assert_eq!(
        sync.pull(),
        SyncStatus::PullSkipped("no auth token configured")
    );
}

#[test]
fn no_remote_skips_push() {
    let l = device();
    let mut sync = SyncCoordinator::new(&l, Transports::none(), instant()).unwrap();
    spend(&l, 1);
    assert!(matches!(sync.shutdown(), Some(SyncStatus::PushSkipped(_))));
}

#[test]
fn pull_without_remote_resource_is_skipped() {
    let l = device();
    let remote = MemoryTransport::gist();
    let mut sync = SyncCoordinator::new(&l, authenticated(&remote), instant()).unwrap();
    assert!(matches!(sync.start(), SyncStatus::PullSkipped(_)));
    assert_eq!(sync.state(), SyncState::Idle);
}

#[test]
fn later_push_wins_on_pull_across_devices() {
    let remote = MemoryTransport::gist();
    let a = device();
    let b = device();
    let shared_id = ensure_identity(&a).unwrap();
    adopt_identity(&b, &shared_id).unwrap();

    let mut sync_a = SyncCoordinator::new(&a, authenticated(&remote), instant()).unwrap();
    spend(&a, 100);
    sync_a.flush();
    let gist_id = a.store().get(GIST_ID_KEY).unwrap().unwrap();

    // Device B writes later and pushes to the same gist.
    b.store().set(GIST_ID_KEY, &gist_id).unwrap();
    let mut sync_b = SyncCoordinator::new(&b, authenticated(&remote), instant()).unwrap();
    std::thread::sleep(Duration::from_millis(5));
    spend(&b, 250);
    sync_b.flush();

    let statuses = sync_a.subscribe_status();
    let status = sync_a.pull();
    assert_eq!(
        status,
        SyncStatus::Pulled {
            updated: vec![DATA_KEY.to_string()]
        }
    );
    let seen: Vec<SyncStatus> = statuses.try_iter().collect();
    assert_eq!(seen.last(), Some(&SyncStatus::ReloadRequired));

    let txs = a.transactions().unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, Decimal::new(250, 0));
    // Merge writes do not schedule a push back.
    assert_eq!(sync_a.poll_events(), SyncState::Idle);

    // Nothing newer remotely: a second pull changes nothing.
    assert_eq!(sync_a.pull(), SyncStatus::Pulled { updated: vec![] });
}

#[test]
fn pull_ignores_snapshots_from_another_identity() {
    let remote = MemoryTransport::gist();
    let a = device();
    let b = device();
    let mut sync_b = SyncCoordinator::new(&b, authenticated(&remote), instant()).unwrap();
    spend(&b, 9);
    sync_b.flush();

    a.store()
        .set(GIST_ID_KEY, &b.store().get(GIST_ID_KEY).unwrap().unwrap())
        .unwrap();
    let mut sync_a = SyncCoordinator::new(&a, authenticated(&remote), instant()).unwrap();
    assert!(matches!(sync_a.pull(), SyncStatus::PullSkipped(_)));
    assert!(a.transactions().unwrap().is_empty());
}

#[test]
fn merge_is_monotonic_per_key() {
    let l = device();
    let local_doc = l.document().unwrap();
    let local_ts = local_doc.timestamp.unwrap();

    let mut older = serde_json::to_value(&local_doc).unwrap();
    older["_timestamp"] = json!(local_ts - 1);
    older["settings"]["currency"] = json!("USD");
    let mut data = Map::new();
    data.insert(DATA_KEY.to_string(), older);
    let outcome = l.apply_remote_snapshot(&data).unwrap();
    assert!(!outcome.reload_required());
    assert_eq!(l.settings().unwrap().currency, "EGP");

    let mut newer = serde_json::to_value(&local_doc).unwrap();
    newer["_timestamp"] = json!(local_ts + 1);
    newer["settings"]["currency"] = json!("USD");
    data.insert(DATA_KEY.to_string(), newer);
    // Keys outside the namespace are never applied.
    data.insert(TOKEN_KEY.to_string(), Value::String("ghp_evil".into()));
    let outcome = l.apply_remote_snapshot(&data).unwrap();
    assert_eq!(outcome.updated, vec![DATA_KEY.to_string()]);
    assert_eq!(l.settings().unwrap().currency, "USD");
    assert_eq!(l.document().unwrap().timestamp, Some(local_ts + 1));
    assert!(l.store().get(TOKEN_KEY).unwrap().is_none());
}

#[test]
fn merged_document_gets_derived_fields_recomputed() {
    let l = device();
    let mut doc = serde_json::to_value(l.document().unwrap()).unwrap();
    doc["_timestamp"] = json!(i64::MAX / 2);
    doc["goals"] = json!([{
        "id": 99, "name": "Trip", "targetAmount": 400, "savedAmount": 100,
        "priority": "low", "progress": 3
    }]);
    let mut data = Map::new();
    data.insert(DATA_KEY.to_string(), doc);
    l.apply_remote_snapshot(&data).unwrap();
    let goals = l.goals().unwrap();
    assert_eq!(goals[0].progress, Decimal::new(25, 0));
}

#[test]
fn unparseable_remote_document_is_skipped() {
    let l = device();
    let mut data = Map::new();
    data.insert(
        DATA_KEY.to_string(),
        json!({"_timestamp": i64::MAX / 2, "transactions": "nope"}),
    );
    let outcome = l.apply_remote_snapshot(&data).unwrap();
    assert_eq!(outcome.skipped, vec![DATA_KEY.to_string()]);
    assert_eq!(l.categories().unwrap().len(), 14);
}

#[test]
fn token_validation_and_forget() {
    let l = device();
    assert!(set_token(&l, "not-a-token").is_err());
    set_token(&l, " ghp_abc ").unwrap();
    assert_eq!(l.store().get(TOKEN_KEY).unwrap().as_deref(), Some("ghp_abc"));
    l.store().set(GIST_ID_KEY, "g1").unwrap();
    let info = sync_info(&l).unwrap();
    assert!(info.token_configured);
    assert_eq!(info.gist_id.as_deref(), Some("g1"));

    forget_remote(&l).unwrap();
    let info = sync_info(&l).unwrap();
    assert!(!info.token_configured);
    assert!(info.gist_id.is_none());
    assert!(info.last_sync.is_none());
}

#[test]
fn watch_loop_pushes_each_cycle() {
    let l = device();
    let remote = MemoryTransport::gist();
    let mut sync = SyncCoordinator::new(&l, authenticated(&remote), instant()).unwrap();
    let statuses = sync.subscribe_status();
    sync.run(Some(2));
    let seen: Vec<SyncStatus> = statuses.try_iter().collect();
    assert!(matches!(seen[0], SyncStatus::PullSkipped(_)));
    let pushes = seen
        .iter()
        .filter(|s| matches!(s, SyncStatus::Pushed { .. }))
        .count();
    assert_eq!(pushes, 2);
    assert_eq!(remote.blobs.borrow().len(), 1);
}

#[test]
fn fresh_device_takes_the_remote_document_on_first_pull() {
    let remote = MemoryTransport::gist();
    let a = device();
    let mut sync_a = SyncCoordinator::new(&a, authenticated(&remote), instant()).unwrap();
    spend(&a, 100);
    sync_a.flush();
    let gist_id = a.store().get(GIST_ID_KEY).unwrap().unwrap();

    // Set up after A's last edit.
    std::thread::sleep(Duration::from_millis(5));
    let b = device();
    let mut sync_b = SyncCoordinator::new(&b, authenticated(&remote), instant()).unwrap();
    run(&b, &mut sync_b, &["identity", "--set", sync_a.user_id(), "--gist", &gist_id]);
    assert_eq!(sync_b.user_id(), sync_a.user_id());

    assert_eq!(
        sync_b.pull(),
        SyncStatus::Pulled {
            updated: vec![DATA_KEY.to_string()]
        }
    );
    let txs = b.transactions().unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, Decimal::new(100, 0));

    spend(&b, 1);
    sync_b.flush();
    let blobs = remote.blobs.borrow();
    assert_eq!(blobs.len(), 1);
    let pushed = blobs[&gist_id].data[DATA_KEY]["transactions"].as_array().unwrap();
    assert_eq!(pushed.len(), 2);
}

#[test]
fn link_command_stores_the_gist_id() {
    let l = device();
    let remote = MemoryTransport::gist();
    let mut sync = SyncCoordinator::new(&l, authenticated(&remote), instant()).unwrap();
    run(&l, &mut sync, &["link", " gist-42 "]);
    assert_eq!(l.store().get(GIST_ID_KEY).unwrap().as_deref(), Some("gist-42"));
    assert_eq!(sync_info(&l).unwrap().gist_id.as_deref(), Some("gist-42"));
    assert!(tallybook::sync::link_remote(&l, "two words").is_err());
    assert_eq!(l.store().get(GIST_ID_KEY).unwrap().as_deref(), Some("gist-42"));
}

#[test]
fn pull_failure_is_reported_not_raised() {
    let remote = MemoryTransport::gist();
    let a = device();
    let mut sync_a = SyncCoordinator::new(&a, authenticated(&remote), instant()).unwrap();
    spend(&a, 3);
    sync_a.flush();
    let before = a.store().get(DATA_KEY).unwrap();

    remote.fail.set(true);
    let statuses = sync_a.subscribe_status();
    let status = sync_a.pull();
    assert!(matches!(status, SyncStatus::PullFailed(_)));
    assert_eq!(sync_a.state(), SyncState::Idle);
    assert_eq!(a.store().get(DATA_KEY).unwrap(), before);
    let seen: Vec<SyncStatus> = statuses.try_iter().collect();
    assert_eq!(seen, vec![status]);
}

#[test]
fn unreadable_remote_resource_fails_the_pull_only() {
    let remote = MemoryTransport::gist();
    let a = device();
    let mut sync_a = SyncCoordinator::new(&a, authenticated(&remote), instant()).unwrap();
    a.store().set(GIST_ID_KEY, "missing").unwrap();
    assert!(matches!(sync_a.pull(), SyncStatus::PullFailed(_)));
    assert_eq!(sync_a.state(), SyncState::Idle);
    assert_eq!(a.categories().unwrap().len(), 14);
}

#[test]
fn watch_command_runs_the_requested_cycles() {
    let l = device();
    let remote = MemoryTransport::gist();
    let mut sync = SyncCoordinator::new(&l, authenticated(&remote), instant()).unwrap();
    run(&l, &mut sync, &["watch", "--cycles", "1"]);
    assert_eq!(remote.blobs.borrow().len(), 1);
    assert_eq!(sync.state(), SyncState::Idle);
    assert!(l.store().get(LAST_SYNC_KEY).unwrap().is_some());
}
