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

//! Bluetooth communication module.
//!
//! Maintains the RFCOMM serial link to the receiver.

mod link;
pub mod protocol;
mod rfcomm;
mod transport;

pub use link::{Accepted, LinkError, LinkManager, LinkTimings, READ_BUFFER_SIZE, WRITE_ATTEMPTS};
pub use protocol::{Frame, FrameError, KEEPALIVE_FRAME, STARTUP_FRAME};
pub use rfcomm::{RfcommConnector, RfcommTransport};
pub use transport::{not_connected, ConnectionTarget, Connector, Transport};
