//! Shared test helpers: an in-memory connector and transport.

#![allow(dead_code)]

use async_trait::async_trait;
use bluer::Address;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use denonbt::bluetooth::{
    not_connected, ConnectionTarget, Connector, LinkManager, LinkTimings, Transport,
};

/// Timings short enough to keep tests fast.
pub fn fast_timings() -> LinkTimings {
    LinkTimings {
        settle_delay: Duration::from_millis(2),
        connect_retry_delay: Duration::from_millis(2),
        write_retry_delay: Duration::from_millis(2),
        read_backoff: Duration::from_millis(2),
    }
}

pub fn test_target() -> ConnectionTarget {
    ConnectionTarget::new(Address::new([0x00, 0x05, 0xcd, 0x12, 0x34, 0x56]), 2)
}

/// Counters and scripted behaviour shared by the mock connector and every
/// transport it hands out.
#[derive(Default)]
pub struct MockShared {
    pub connect_attempts: AtomicUsize,
    pub connect_failures_left: AtomicUsize,
    /// Successful connects.
    pub connections: AtomicUsize,
    pub connects_in_flight: AtomicUsize,
    pub max_connects_in_flight: AtomicUsize,
    pub closes: AtomicUsize,
    pub write_attempts: AtomicUsize,
    pub read_attempts: AtomicUsize,
    /// Fail every write.
    pub fail_writes: AtomicBool,
    /// Fail writes on the first connection only.
    pub fail_first_connection_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    pub written: Mutex<Vec<Vec<u8>>>,
    pub inbound: Mutex<VecDeque<Vec<u8>>>,
}

impl MockShared {
    pub fn connects(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.read_attempts.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().clone()
    }
}

#[derive(Clone, Default)]
pub struct MockConnector {
    pub shared: Arc<MockShared>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` connect attempts.
    pub fn failing_connects(count: usize) -> Self {
        let connector = Self::new();
        connector
            .shared
            .connect_failures_left
            .store(count, Ordering::SeqCst);
        connector
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _target: &ConnectionTarget) -> io::Result<Arc<dyn Transport>> {
        let shared = &self.shared;
        shared.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let in_flight = shared.connects_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        shared
            .max_connects_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        // Widen the window for overlapping connects.
        tokio::time::sleep(Duration::from_millis(2)).await;
        shared.connects_in_flight.fetch_sub(1, Ordering::SeqCst);

        let should_fail = shared
            .connect_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
        }

        let established = shared.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockTransport {
            shared: shared.clone(),
            first_connection: established == 0,
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct MockTransport {
    shared: Arc<MockShared>,
    first_connection: bool,
    closed: AtomicBool,
}

#[async_trait]
impl Transport for MockTransport {
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.shared.read_attempts.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(not_connected());
        }
        if self.shared.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "read failed"));
        }

        let next = self.shared.inbound.lock().pop_front();
        match next {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            None => {
                tokio::time::sleep(Duration::from_millis(1)).await;
                Ok(0)
            }
        }
    }

    async fn write(&self, data: &[u8]) -> io::Result<()> {
        self.shared.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(not_connected());
        }
        let fail = self.shared.fail_writes.load(Ordering::SeqCst)
            || (self.first_connection
                && self.shared.fail_first_connection_writes.load(Ordering::SeqCst));
        if fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        self.shared.written.lock().push(data.to_vec());
        Ok(())
    }

    async fn close(&self) -> io::Result<()> {
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A link over a fresh mock connector, not yet opened.
pub fn mock_link(connector: &MockConnector) -> Arc<LinkManager> {
    mock_link_with(connector, fast_timings())
}

pub fn mock_link_with(connector: &MockConnector, timings: LinkTimings) -> Arc<LinkManager> {
    LinkManager::new(Arc::new(connector.clone()), Some(test_target()), timings)
}

/// Poll `condition` until it holds, panicking after a few seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not met in time");
}
