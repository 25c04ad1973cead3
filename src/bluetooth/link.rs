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

//! Serial link manager.
//!
//! Owns the single connection to the receiver. All writers, the background
//! reader and the keepalive loop go through one [`LinkManager`], which
//! serializes access to the transport with a single lock and reconnects
//! whenever a write fails.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::protocol::{hex_dump_lines, Frame};
use super::transport::{not_connected, ConnectionTarget, Connector, Transport};
use crate::state::{LinkPhase, LinkStatus};

/// Write attempts per frame before it is dropped.
pub const WRITE_ATTEMPTS: u32 = 3;

/// Size of the background reader's buffer.
pub const READ_BUFFER_SIZE: usize = 512;

/// Errors returned by the connection supervisor.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    #[error("remote hardware address must be set")]
    MissingTarget,

    #[error("link is shutting down")]
    Shutdown,
}

/// Delays used by the link manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTimings {
    /// Pause between closing a connection and reopening it. The remote
    /// stack refuses an immediate reconnect.
    pub settle_delay: Duration,
    /// Pause between failed connect attempts.
    pub connect_retry_delay: Duration,
    /// Pause after a failed write before the next attempt.
    pub write_retry_delay: Duration,
    /// Pause after a failed read.
    pub read_backoff: Duration,
}

impl Default for LinkTimings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            connect_retry_delay: Duration::from_secs(1),
            write_retry_delay: Duration::from_secs(1),
            read_backoff: Duration::from_secs(1),
        }
    }
}

/// Result of [`LinkManager::send`].
///
/// A frame is only ever accepted for transmission. Whether it reached the
/// device is not reported: failed writes are retried, logged and finally
/// dropped without surfacing to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted;

/// State guarded by the link lock.
struct LinkState {
    transport: Option<Arc<dyn Transport>>,
    connected: bool,
    /// Bumped on every successful connect.
    generation: u64,
}

/// When an already connected link should be torn down and reopened.
#[derive(Debug, Clone, Copy)]
enum Reopen {
    Never,
    Always,
    /// Only while the link is still on the given generation.
    Stale(u64),
}

/// Manages the lifecycle of the serial link.
pub struct LinkManager {
    connector: Arc<dyn Connector>,
    target: Option<ConnectionTarget>,
    timings: LinkTimings,
    state: Mutex<LinkState>,
    status: Arc<LinkStatus>,
    shutdown: watch::Sender<bool>,
}

impl LinkManager {
    /// Create a link manager. No connection is made until
    /// [`open_link`](Self::open_link) is called.
    pub fn new(
        connector: Arc<dyn Connector>,
        target: Option<ConnectionTarget>,
        timings: LinkTimings,
    ) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            connector,
            target,
            timings,
            state: Mutex::new(LinkState {
                transport: None,
                connected: false,
                generation: 0,
            }),
            status: LinkStatus::new(),
            shutdown,
        })
    }

    pub fn status(&self) -> &Arc<LinkStatus> {
        &self.status
    }

    /// Whether the link currently holds an open connection.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.connected
    }

    /// Open the link, retrying until it succeeds.
    ///
    /// Does nothing if the link is connected and `force_reopen` is false.
    /// With `force_reopen` the current connection is closed first.
    pub async fn open_link(&self, force_reopen: bool) -> Result<(), LinkError> {
        let reopen = if force_reopen {
            Reopen::Always
        } else {
            Reopen::Never
        };
        let mut state = self.state.lock().await;
        self.open_locked(&mut state, reopen).await
    }

    /// Reopen the link after a write failed on connection `generation`.
    ///
    /// Writers that failed on the same dead connection queue up here. The
    /// first one reconnects, the others find a fresh connection and return.
    async fn reopen_after_failure(&self, generation: u64) -> Result<(), LinkError> {
        let mut state = self.state.lock().await;
        self.open_locked(&mut state, Reopen::Stale(generation)).await
    }

    async fn open_locked(&self, state: &mut LinkState, reopen: Reopen) -> Result<(), LinkError> {
        let mut reopened = false;

        if state.connected {
            let close = match reopen {
                Reopen::Never => false,
                Reopen::Always => true,
                Reopen::Stale(generation) => generation == state.generation,
            };
            if !close {
                if matches!(reopen, Reopen::Stale(_)) {
                    debug!("Link already reopened, skipping reconnect");
                }
                return Ok(());
            }

            self.status.set_phase(LinkPhase::Reconnecting);
            self.status.record_disconnected();
            state.connected = false;
            if let Some(transport) = state.transport.take() {
                match transport.close().await {
                    Ok(()) => info!("existing port closed"),
                    Err(e) => error!("error closing port: {}", e),
                }
            }
            reopened = true;

            if !self.pause(self.timings.settle_delay).await {
                return Err(LinkError::Shutdown);
            }
        }

        let Some(target) = self.target else {
            return Err(LinkError::MissingTarget);
        };

        if !reopened {
            self.status.set_phase(LinkPhase::Connecting);
        }

        loop {
            let Some(result) = self.until_shutdown(self.connector.connect(&target)).await else {
                return Err(LinkError::Shutdown);
            };

            match result {
                Ok(transport) => {
                    state.transport = Some(transport);
                    state.connected = true;
                    state.generation += 1;
                    self.status.record_connected(reopened);
                    info!("port opened: {}", target);
                    return Ok(());
                }
                Err(e) => {
                    error!("error opening port {}: {}", target, e);
                    self.status.record_connect_failure();
                    if !self.pause(self.timings.connect_retry_delay).await {
                        return Err(LinkError::Shutdown);
                    }
                }
            }
        }
    }

    /// Write a frame to the device.
    ///
    /// Each attempt holds the link lock for the duration of the write. On
    /// failure the link is reopened and the write retried, up to
    /// [`WRITE_ATTEMPTS`] attempts in total.
    pub async fn send(&self, frame: &Frame) -> Accepted {
        for attempt in 1..=WRITE_ATTEMPTS {
            let will_retry = attempt < WRITE_ATTEMPTS;

            let (result, generation) = {
                let state = self.state.lock().await;
                let result = match (&state.transport, state.connected) {
                    (Some(transport), true) => transport.write(frame.as_bytes()).await,
                    _ => Err(not_connected()),
                };
                (result, state.generation)
            };

            match result {
                Ok(()) => {
                    for line in frame.dump_lines() {
                        info!("wrote data: {}", line);
                    }
                    self.status.record_write();
                    return Accepted;
                }
                Err(e) => {
                    error!(
                        data = %frame,
                        attempt,
                        will_retry,
                        "error writing to port: {}", e
                    );
                    if let Err(e) = self.reopen_after_failure(generation).await {
                        warn!("dropping frame {}: {}", frame, e);
                        break;
                    }
                    if !self.pause(self.timings.write_retry_delay).await {
                        break;
                    }
                }
            }
        }

        self.status.record_drop();
        Accepted
    }

    /// Drain inbound bytes until shutdown.
    ///
    /// Read failures are waited out; reconnecting is left to the writers.
    pub async fn run_reader(self: Arc<Self>) {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut failures: u64 = 0;

        info!("Background reader started");

        loop {
            let result = match self.current_transport().await {
                Some(transport) => match self.until_shutdown(transport.read(&mut buf)).await {
                    Some(result) => result,
                    None => break,
                },
                None => Err(not_connected()),
            };

            let err = match result {
                Ok(0) => io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream"),
                Ok(n) => {
                    failures = 0;
                    for line in hex_dump_lines(&buf[..n]) {
                        info!("read data: {}", line);
                    }
                    self.status.record_read(n);
                    continue;
                }
                Err(e) => e,
            };

            failures += 1;
            if failures == 1 {
                error!("error reading from port: {}", err);
            } else {
                debug!(failures, "error reading from port: {}", err);
            }

            if !self.pause(self.timings.read_backoff).await {
                break;
            }
        }

        info!("Background reader stopped");
    }

    /// Send `frame` every `interval` while connected, until shutdown.
    pub async fn run_keepalive(self: Arc<Self>, interval: Duration, frame: Frame) {
        info!("Keepalive started, interval {:?}", interval);

        loop {
            if self.is_connected().await {
                self.send(&frame).await;
            }
            if !self.pause(interval).await {
                break;
            }
        }

        info!("Keepalive stopped");
    }

    /// Ask every loop to stop. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Link shutdown requested");
            self.status.set_phase(LinkPhase::Stopped);
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves once [`shutdown`](Self::shutdown) has been called.
    pub async fn shutdown_requested(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|stop| *stop).await;
    }

    async fn current_transport(&self) -> Option<Arc<dyn Transport>> {
        let state = self.state.lock().await;
        if state.connected {
            state.transport.clone()
        } else {
            None
        }
    }

    /// Run `fut` unless shutdown is requested first.
    async fn until_shutdown<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut rx = self.shutdown.subscribe();
        tokio::select! {
            output = fut => Some(output),
            _ = rx.wait_for(|stop| *stop) => None,
        }
    }

    /// Sleep for `delay`. Returns false if interrupted by shutdown.
    async fn pause(&self, delay: Duration) -> bool {
        self.until_shutdown(tokio::time::sleep(delay)).await.is_some()
    }
}
