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

//! Bluetooth RFCOMM client transport.

use async_trait::async_trait;
use bluer::rfcomm::stream::{OwnedReadHalf, OwnedWriteHalf};
use bluer::rfcomm::{SocketAddr, Stream};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{watch, Mutex};
use tracing::debug;

use super::transport::{not_connected, ConnectionTarget, Connector, Transport};

/// Opens RFCOMM client connections through BlueZ.
#[derive(Debug, Default, Clone, Copy)]
pub struct RfcommConnector;

impl RfcommConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for RfcommConnector {
    async fn connect(&self, target: &ConnectionTarget) -> io::Result<Arc<dyn Transport>> {
        debug!("Connecting RFCOMM socket to {}", target);
        let stream = Stream::connect(SocketAddr::new(target.address, target.channel)).await?;
        Ok(Arc::new(RfcommTransport::new(stream)))
    }
}

/// A connected RFCOMM stream.
///
/// The stream is split so the background reader can block in `read`
/// while writers keep using the write half.
pub struct RfcommTransport {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    closed: watch::Sender<bool>,
}

impl RfcommTransport {
    pub fn new(stream: Stream) -> Self {
        let (reader, writer) = stream.into_split();
        let (closed, _) = watch::channel(false);
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            closed,
        }
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl Transport for RfcommTransport {
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(not_connected());
        }

        let mut closed = self.closed.subscribe();
        let mut reader = self.reader.lock().await;

        tokio::select! {
            result = reader.read(buf) => result,
            _ = closed.wait_for(|closed| *closed) => Err(not_connected()),
        }
    }

    async fn write(&self, data: &[u8]) -> io::Result<()> {
        if self.is_closed() {
            return Err(not_connected());
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(data).await?;
        writer.flush().await
    }

    async fn close(&self) -> io::Result<()> {
        if self.closed.send_replace(true) {
            return Ok(());
        }

        let mut writer = self.writer.lock().await;
        writer.shutdown().await
    }
}
