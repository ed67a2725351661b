// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Change notification for committed store writes.
//!
//! The store calls [`ChangeNotifier::publish`] only after a write has been
//! committed, so a slow or vanished subscriber can never undo or fail it.

use std::sync::mpsc::{self, Receiver, Sender};

/// Who caused a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// An ordinary mutation made on this device.
    Local,
    /// A value written while merging a pulled remote snapshot.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: String,
    pub value: String,
    pub origin: ChangeOrigin,
}

/// Fan-out bus for [`ChangeEvent`]s.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscribers: Vec<Sender<ChangeEvent>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Best-effort broadcast. Subscribers whose receiver has been dropped are
    /// pruned; nothing is reported back to the writer.
    pub fn publish(&mut self, event: ChangeEvent) {
        tracing::debug!(key = %event.key, origin = ?event.origin, "store change");
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
