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

//! Byte stream transport abstraction.
//!
//! The link manager never talks to a socket directly. It asks a
//! [`Connector`] for a fresh [`Transport`] every time the link is
//! (re)opened, which keeps the reconnect logic testable without Bluetooth
//! hardware.

use async_trait::async_trait;
use bluer::Address;
use std::fmt;
use std::io;
use std::sync::Arc;

/// Remote device address and RFCOMM channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub address: Address,
    pub channel: u8,
}

impl ConnectionTarget {
    pub fn new(address: Address, channel: u8) -> Self {
        Self { address, channel }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} channel {}", self.address, self.channel)
    }
}

/// Opens connections to a [`ConnectionTarget`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a new connection.
    ///
    /// The returned transport counts as connected until [`Transport::close`]
    /// is called on it.
    async fn connect(&self, target: &ConnectionTarget) -> io::Result<Arc<dyn Transport>>;
}

/// One established point-to-point byte stream.
///
/// Reads and writes may run concurrently from different tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read available bytes into `buf`. `Ok(0)` means end of stream.
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole of `data`.
    async fn write(&self, data: &[u8]) -> io::Result<()>;

    /// Close the connection. Pending and later reads fail.
    async fn close(&self) -> io::Result<()>;
}

/// Error returned for operations on a link without a live transport.
pub fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "port not connected")
}
