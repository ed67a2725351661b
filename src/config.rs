// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::Store;
use crate::sync::{SyncOptions, TOKEN_KEY, Transports};
use crate::transport::{DEFAULT_GIST_API, DEFAULT_PASTE_ENDPOINT, GistTransport, PasteTransport};
use crate::utils::http_client;
use anyhow::Result;
use std::time::Duration;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Sync settings from the environment (and `.env`), with the stored token as
/// fallback for the gist credentials.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub github_token: Option<String>,
    pub gist_api: String,
    pub paste_endpoint: String,
    pub paste_key: Option<String>,
    pub push_interval: Duration,
    pub pull_delay: Duration,
}

impl SyncConfig {
    pub fn load(store: &Store) -> Result<Self> {
        let github_token = match env_var("TALLYBOOK_GITHUB_TOKEN") {
            Some(t) => Some(t),
            None => store.get(TOKEN_KEY)?,
        };
        let interval_secs: u64 = env_var("TALLYBOOK_SYNC_INTERVAL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        let pull_delay_ms: u64 = env_var("TALLYBOOK_PULL_DELAY_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(2000);
        Ok(Self {
            github_token,
            gist_api: env_var("TALLYBOOK_GIST_API").unwrap_or_else(|| DEFAULT_GIST_API.into()),
            paste_endpoint: env_var("TALLYBOOK_PASTE_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_PASTE_ENDPOINT.into()),
            paste_key: env_var("TALLYBOOK_PASTE_KEY"),
            push_interval: Duration::from_secs(interval_secs),
            pull_delay: Duration::from_millis(pull_delay_ms),
        })
    }

    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            push_interval: self.push_interval,
            pull_delay: self.pull_delay,
            ..SyncOptions::default()
        }
    }

    /// Builds the configured transports. The anonymous paste transport is
    /// only offered when a paste key is set.
    pub fn transports(&self) -> Result<Transports> {
        let mut t = Transports::none();
        if self.github_token.is_none() && self.paste_key.is_none() {
            return Ok(t);
        }
        let client = http_client()?;
        if let Some(token) = &self.github_token {
            t.authenticated = Some(Box::new(GistTransport::new(
                client.clone(),
                &self.gist_api,
                token,
            )));
        }
        if let Some(key) = &self.paste_key {
            t.anonymous = Some(Box::new(PasteTransport::new(
                client,
                &self.paste_endpoint,
                key,
            )));
        }
        Ok(t)
    }
}
