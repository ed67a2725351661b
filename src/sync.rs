// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Opportunistic mirroring of the namespaced store to a remote blob store.
//!
//! Local writes mark a push as pending; [`SyncCoordinator::flush`] coalesces
//! any number of them into one push. Pulls merge through
//! [`Ledger::apply_remote_snapshot`]. Transport failures are logged and
//! reported as [`SyncStatus`] values, never returned as errors.

use crate::error::{LedgerError, SyncError};
use crate::ledger::Ledger;
use crate::notify::{ChangeEvent, ChangeOrigin};
use crate::transport::{GIST_ID_KEY, PASTE_URL_KEY, RemoteTransport, SyncPayload};
use crate::utils::{device_descriptor, now_ms};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rand::Rng;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

pub const USER_ID_KEY: &str = "tallybook_user_id";
pub const TOKEN_KEY: &str = "github_token";
pub const LAST_SYNC_KEY: &str = "last_sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    PushPending,
    Pulling,
    Merging,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    Pushed {
        transport: &'static str,
        resource_id: String,
        at: DateTime<Utc>,
    },
    PushFailed {
        transport: &'static str,
        message: String,
    },
    PushSkipped(&'static str),
    Pulled {
        updated: Vec<String>,
    },
    PullSkipped(&'static str),
    PullFailed(String),
    /// Merged data changed persisted state; in-memory views must re-read.
    ReloadRequired,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Pushed {
                transport,
                resource_id,
                at,
            } => write!(
                f,
                "synced via {} at {} ({})",
                transport,
                at.format("%H:%M:%S"),
                resource_id
            ),
            SyncStatus::PushFailed { transport, message } => {
                write!(f, "sync via {} failed, will retry later: {}", transport, message)
            }
            SyncStatus::PushSkipped(why) => write!(f, "push skipped: {}", why),
            SyncStatus::Pulled { updated } if updated.is_empty() => {
                write!(f, "pulled; local data already up to date")
            }
            SyncStatus::Pulled { updated } => {
                write!(f, "pulled; updated {}", updated.join(", "))
            }
            SyncStatus::PullSkipped(why) => write!(f, "pull skipped: {}", why),
            SyncStatus::PullFailed(msg) => write!(f, "no cloud data available: {}", msg),
            SyncStatus::ReloadRequired => write!(f, "data updated from the cloud; reload required"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub push_interval: Duration,
    pub pull_delay: Duration,
    pub reload_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            push_interval: Duration::from_secs(5 * 60),
            pull_delay: Duration::from_secs(2),
            reload_delay: Duration::from_secs(1),
        }
    }
}

/// Remote stores available to the coordinator. Pushes prefer the
/// authenticated one; pulls require it.
#[derive(Default)]
pub struct Transports {
    pub authenticated: Option<Box<dyn RemoteTransport>>,
    pub anonymous: Option<Box<dyn RemoteTransport>>,
}

impl Transports {
    pub fn none() -> Self {
        Self::default()
    }

    fn for_push(&self) -> Option<&dyn RemoteTransport> {
        self.authenticated
            .as_deref()
            .or(self.anonymous.as_deref())
    }
}

fn random_suffix(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn read_user_id(ledger: &Ledger) -> Result<Option<String>, LedgerError> {
    Ok(ledger
        .store()
        .get(USER_ID_KEY)?
        .and_then(|raw| serde_json::from_str::<String>(&raw).ok()))
}

/// Returns the persisted identity, creating `user_<ms>_<random>` on first use.
pub fn ensure_identity(ledger: &Ledger) -> Result<String, LedgerError> {
    if let Some(id) = read_user_id(ledger)? {
        return Ok(id);
    }
    let id = format!("user_{}_{}", now_ms(), random_suffix(9));
    adopt_identity(ledger, &id)?;
    tracing::info!(user_id = %id, "created sync identity");
    Ok(id)
}

/// Replaces the identity, e.g. to join another device's sync stream.
pub fn adopt_identity(ledger: &Ledger, id: &str) -> Result<(), LedgerError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(LedgerError::Validation("user id must not be empty".into()));
    }
    let text = serde_json::Value::String(id.to_string()).to_string();
    ledger.store().set(USER_ID_KEY, &text)?;
    Ok(())
}

/// Stores the gist token. Classic (`ghp_`) and fine-grained (`github_pat_`)
/// tokens are accepted.
pub fn set_token(ledger: &Ledger, token: &str) -> Result<(), LedgerError> {
    let token = token.trim();
    if !(token.starts_with("ghp_") || token.starts_with("github_pat_")) {
        return Err(LedgerError::Validation(
            "Invalid token: expected a GitHub token starting with ghp_ or github_pat_".into(),
        ));
    }
    ledger.store().set(TOKEN_KEY, token)?;
    Ok(())
}

/// Drops the token and every remembered remote resource.
pub fn forget_remote(ledger: &Ledger) -> Result<(), LedgerError> {
    for key in [TOKEN_KEY, GIST_ID_KEY, PASTE_URL_KEY, LAST_SYNC_KEY] {
        ledger.store().remove(key)?;
    }
    Ok(())
}

/// Points pushes and pulls at an existing gist, so a new device can join
/// the snapshot another device created.
pub fn link_remote(ledger: &Ledger, gist_id: &str) -> Result<(), LedgerError> {
    let gist_id = gist_id.trim();
    if gist_id.is_empty() || gist_id.contains(char::is_whitespace) {
        return Err(LedgerError::Validation("gist id must be a single non-empty word".into()));
    }
    ledger.store().set(GIST_ID_KEY, gist_id)?;
    Ok(())
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInfo {
    pub user_id: Option<String>,
    pub token_configured: bool,
    pub gist_id: Option<String>,
    pub paste_url: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
}

pub fn sync_info(ledger: &Ledger) -> Result<SyncInfo, LedgerError> {
    let store = ledger.store();
    let last_sync = store
        .get(LAST_SYNC_KEY)?
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    Ok(SyncInfo {
        user_id: read_user_id(ledger)?,
        token_configured: store.get(TOKEN_KEY)?.is_some(),
        gist_id: store.get(GIST_ID_KEY)?,
        paste_url: store.get(PASTE_URL_KEY)?,
        last_sync,
    })
}

pub struct SyncCoordinator<'a> {
    ledger: &'a Ledger,
    events: Receiver<ChangeEvent>,
    transports: Transports,
    options: SyncOptions,
    user_id: String,
    state: SyncState,
    status_subscribers: Vec<Sender<SyncStatus>>,
}

impl<'a> SyncCoordinator<'a> {
    pub fn new(
        ledger: &'a Ledger,
        transports: Transports,
        options: SyncOptions,
    ) -> Result<Self, LedgerError> {
        let user_id = ensure_identity(ledger)?;
        let events = ledger.subscribe();
        tracing::debug!(user_id = %user_id, "sync coordinator ready");
        Ok(Self {
            ledger,
            events,
            transports,
            options,
            user_id,
            state: SyncState::Idle,
            status_subscribers: Vec::new(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Switches to another identity; later pushes and pulls use it.
    pub fn set_user_id(&mut self, id: &str) -> Result<(), LedgerError> {
        adopt_identity(self.ledger, id)?;
        self.user_id = id.trim().to_string();
        Ok(())
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn subscribe_status(&mut self) -> Receiver<SyncStatus> {
        let (tx, rx) = mpsc::channel();
        self.status_subscribers.push(tx);
        rx
    }

    fn publish(&mut self, status: SyncStatus) {
        self.status_subscribers
            .retain(|tx| tx.send(status.clone()).is_ok());
    }

    /// Drains change events; any local write marks a push as pending.
    pub fn poll_events(&mut self) -> SyncState {
        while let Ok(ev) = self.events.try_recv() {
            if ev.origin == ChangeOrigin::Local && self.state == SyncState::Idle {
                tracing::debug!(key = %ev.key, "data changed; push pending");
                self.state = SyncState::PushPending;
            }
        }
        self.state
    }

    /// Performs one push if local changes are pending.
    pub fn flush(&mut self) -> Option<SyncStatus> {
        if self.poll_events() == SyncState::PushPending {
            Some(self.push())
        } else {
            None
        }
    }

    /// Best-effort push on the way out.
    pub fn shutdown(&mut self) -> Option<SyncStatus> {
        self.flush()
    }

    pub fn snapshot(&self) -> Result<SyncPayload, LedgerError> {
        Ok(SyncPayload {
            user_id: self.user_id.clone(),
            data: self.ledger.namespaced_snapshot()?,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            device: device_descriptor(),
        })
    }

    fn try_push(&self, transport: &dyn RemoteTransport) -> Result<SyncStatus, SyncError> {
        let payload = self.snapshot()?;
        let store = self.ledger.store();
        let key = transport.resource_key();
        let existing = store.get(key).map_err(LedgerError::from)?;
        let resource_id = transport.create_or_update(existing.as_deref(), &payload)?;
        if existing.as_deref() != Some(resource_id.as_str()) {
            store.set(key, &resource_id).map_err(LedgerError::from)?;
        }
        store
            .set(LAST_SYNC_KEY, &now_ms().to_string())
            .map_err(LedgerError::from)?;
        Ok(SyncStatus::Pushed {
            transport: transport.name(),
            resource_id,
            at: Utc::now(),
        })
    }

    /// Pushes the full namespaced snapshot. Never fails; the outcome is
    /// returned and broadcast to status subscribers.
    pub fn push(&mut self) -> SyncStatus {
        let status = match self.transports.for_push() {
            None => SyncStatus::PushSkipped("no remote configured"),
            Some(t) => match self.try_push(t) {
                Ok(s) => {
                    tracing::info!("{}", s);
                    s
                }
                Err(e) => {
                    tracing::warn!(transport = t.name(), "sync failed: {}", e);
                    SyncStatus::PushFailed {
                        transport: t.name(),
                        message: e.to_string(),
                    }
                }
            },
        };
        // Our own bookkeeping writes are outside the namespace, but drain
        // anyway so a push never immediately re-arms itself.
        while self.events.try_recv().is_ok() {}
        self.state = SyncState::Idle;
        self.publish(status.clone());
        status
    }

    /// Fetches the remote snapshot and merges it when it belongs to this
    /// identity. Only possible with an authenticated transport and a
    /// previously created remote resource.
    pub fn pull(&mut self) -> SyncStatus {
        let pending = self.poll_events() == SyncState::PushPending;
        self.state = SyncState::Pulling;
        let status = self.pull_inner();
        // Merge writes are tagged remote and never re-arm a push.
        while let Ok(ev) = self.events.try_recv() {
            if ev.origin == ChangeOrigin::Local {
                tracing::debug!(key = %ev.key, "local change during pull");
            }
        }
        self.state = if pending {
            SyncState::PushPending
        } else {
            SyncState::Idle
        };
        self.publish(status.clone());
        if matches!(&status, SyncStatus::Pulled { updated } if !updated.is_empty()) {
            thread::sleep(self.options.reload_delay);
            self.publish(SyncStatus::ReloadRequired);
        }
        status
    }

    fn pull_inner(&mut self) -> SyncStatus {
        let Some(transport) = self.transports.authenticated.as_deref() else {
            return SyncStatus::PullSkipped("no auth token configured");
        };
        let resource_id = match self.ledger.store().get(GIST_ID_KEY) {
            Ok(Some(id)) => id,
            Ok(None) => return SyncStatus::PullSkipped("no remote snapshot created yet"),
            Err(e) => return SyncStatus::PullFailed(e.to_string()),
        };
        let payload = match transport.read(&resource_id) {
            Ok(p) => p,
            Err(e) => {
                tracing::info!("no cloud data available: {}", e);
                return SyncStatus::PullFailed(e.to_string());
            }
        };
        if payload.user_id != self.user_id {
            tracing::info!(remote = %payload.user_id, "remote snapshot belongs to another identity");
            return SyncStatus::PullSkipped("remote snapshot belongs to another identity");
        }
        self.state = SyncState::Merging;
        match self.ledger.apply_remote_snapshot(&payload.data) {
            Ok(outcome) => SyncStatus::Pulled {
                updated: outcome.updated,
            },
            Err(e) => {
                tracing::warn!("merge failed: {}", e);
                SyncStatus::PullFailed(e.to_string())
            }
        }
    }

    /// Startup sequence: wait for the store to settle, then pull once.
    pub fn start(&mut self) -> SyncStatus {
        thread::sleep(self.options.pull_delay);
        self.pull()
    }

    /// Long-running loop: start, then push every `push_interval`. Stops
    /// after `max_cycles` pushes when given.
    pub fn run(&mut self, max_cycles: Option<u64>) {
        tracing::info!(
            interval_secs = self.options.push_interval.as_secs(),
            "auto-sync started"
        );
        self.start();
        let mut cycles = 0u64;
        while max_cycles.is_none_or(|max| cycles < max) {
            thread::sleep(self.options.push_interval);
            self.poll_events();
            self.push();
            cycles += 1;
        }
    }
}
