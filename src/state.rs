// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Observable link status.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Lifecycle phase of the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPhase {
    /// No remote address configured yet.
    Unconfigured,
    /// First connection attempt in progress.
    Connecting,
    Connected,
    /// Reopening after a write failure.
    Reconnecting,
    /// Shutdown requested.
    Stopped,
}

/// Traffic and failure counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkCounters {
    pub frames_written: u64,
    pub frames_dropped: u64,
    pub bytes_read: u64,
    pub connect_failures: u64,
    pub reconnects: u64,
}

/// Point-in-time copy of the link status, as served by `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub phase: LinkPhase,
    pub connected: bool,
    #[serde(flatten)]
    pub counters: LinkCounters,
}

/// Shared link status.
///
/// Purely informational; the link manager never reads it back to make
/// decisions. [`LinkPhase::Stopped`] is terminal.
#[derive(Debug)]
pub struct LinkStatus {
    phase: RwLock<LinkPhase>,
    connected: RwLock<bool>,
    counters: RwLock<LinkCounters>,
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self {
            phase: RwLock::new(LinkPhase::Unconfigured),
            connected: RwLock::new(false),
            counters: RwLock::new(LinkCounters::default()),
        }
    }
}

impl LinkStatus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_phase(&self, phase: LinkPhase) {
        let mut current = self.phase.write();
        if *current != LinkPhase::Stopped {
            *current = phase;
        }
    }

    pub fn phase(&self) -> LinkPhase {
        *self.phase.read()
    }

    /// Whether a connection is open, independent of the phase.
    pub fn is_connected(&self) -> bool {
        *self.connected.read()
    }

    pub fn record_connected(&self, reopened: bool) {
        self.set_phase(LinkPhase::Connected);
        *self.connected.write() = true;
        if reopened {
            self.counters.write().reconnects += 1;
        }
    }

    pub fn record_disconnected(&self) {
        *self.connected.write() = false;
    }

    pub fn record_connect_failure(&self) {
        self.counters.write().connect_failures += 1;
    }

    pub fn record_write(&self) {
        self.counters.write().frames_written += 1;
    }

    pub fn record_drop(&self) {
        self.counters.write().frames_dropped += 1;
    }

    pub fn record_read(&self, bytes: usize) {
        self.counters.write().bytes_read += bytes as u64;
    }

    pub fn counters(&self) -> LinkCounters {
        *self.counters.read()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.phase(),
            connected: self.is_connected(),
            counters: self.counters(),
        }
    }
}
