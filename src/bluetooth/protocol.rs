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

//! Command frames and their hex representations.

use std::fmt;
use thiserror::Error;

/// Bytes shown per hex dump row.
pub const DUMP_ROW_LEN: usize = 16;

/// Frame sent once right after the first connection is established.
///
/// The receiver's companion app opens every session with it. Its meaning
/// is undocumented.
pub const STARTUP_FRAME: &[u8] = &[0x41, 0x54, 0x00, 0x0b, 0x00, 0x00];

/// Frame sent periodically to keep an idle link alive.
///
/// Same undocumented bytes as [`STARTUP_FRAME`].
pub const KEEPALIVE_FRAME: &[u8] = STARTUP_FRAME;

/// Errors produced while building a frame from user input.
#[derive(Error, Debug, PartialEq)]
pub enum FrameError {
    #[error("invalid hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("frame is empty")]
    Empty,
}

/// An immutable command frame ready to be written to the link.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Create a frame from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a hex string, ignoring any whitespace between digits.
    pub fn from_hex(input: &str) -> Result<Self, FrameError> {
        let compact = strip_whitespace(input);
        let bytes = hex::decode(compact)?;
        if bytes.is_empty() {
            return Err(FrameError::Empty);
        }
        Ok(Self(bytes))
    }

    /// The startup frame.
    pub fn startup() -> Self {
        Self::new(STARTUP_FRAME)
    }

    /// The keepalive frame.
    pub fn keepalive() -> Self {
        Self::new(KEEPALIVE_FRAME)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex without separators.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Hex dump rows for logging.
    pub fn dump_lines(&self) -> Vec<String> {
        hex_dump_lines(&self.0)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.to_hex())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Remove all whitespace from a hex string.
pub fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Render bytes as canonical hex dump rows.
///
/// Each row holds up to 16 bytes: an 8 digit offset, two groups of eight
/// hex bytes and the printable ASCII column, e.g.
/// `00000000  41 54 00 0a 01 01 fe                              |AT.....|`.
pub fn hex_dump_lines(data: &[u8]) -> Vec<String> {
    data.chunks(DUMP_ROW_LEN)
        .enumerate()
        .map(|(row, chunk)| {
            let mut line = format!("{:08x}  ", row * DUMP_ROW_LEN);

            for i in 0..DUMP_ROW_LEN {
                match chunk.get(i) {
                    Some(byte) => line.push_str(&format!("{:02x} ", byte)),
                    None => line.push_str("   "),
                }
                if i == 7 || i == DUMP_ROW_LEN - 1 {
                    line.push(' ');
                }
            }

            line.push('|');
            line.extend(chunk.iter().map(|&b| printable(b)));
            line.push('|');
            line
        })
        .collect()
}

fn printable(byte: u8) -> char {
    if (0x20..=0x7e).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_strips_whitespace() {
        let frame = Frame::from_hex("41 54 00 0a 01 01 fe").unwrap();
        assert_eq!(frame.as_bytes(), &[0x41, 0x54, 0x00, 0x0a, 0x01, 0x01, 0xfe]);
        assert_eq!(frame.to_hex(), "4154000a0101fe");

        let frame = Frame::from_hex("4154\n00 0b\t0000\r\n").unwrap();
        assert_eq!(frame.as_bytes(), STARTUP_FRAME);
    }

    #[test]
    fn test_from_hex_rejects_malformed() {
        assert!(matches!(
            Frame::from_hex("41 5"),
            Err(FrameError::InvalidHex(_))
        ));
        assert!(matches!(
            Frame::from_hex("zz"),
            Err(FrameError::InvalidHex(_))
        ));
        assert_eq!(Frame::from_hex("   "), Err(FrameError::Empty));
        assert_eq!(Frame::from_hex(""), Err(FrameError::Empty));
    }

    #[test]
    fn test_hex_dump_short_row() {
        let lines = hex_dump_lines(&[0x41, 0x54, 0x00, 0x0a, 0x01, 0x01, 0xfe]);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "00000000  41 54 00 0a 01 01 fe                              |AT.....|"
        );
    }

    #[test]
    fn test_hex_dump_multiple_rows() {
        let data: Vec<u8> = (0x30..0x30 + 20).collect();
        let lines = hex_dump_lines(&data);

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "00000000  30 31 32 33 34 35 36 37  38 39 3a 3b 3c 3d 3e 3f  |0123456789:;<=>?|"
        );
        assert_eq!(
            lines[1],
            "00000010  40 41 42 43                                       |@ABC|"
        );
        // Rows line up regardless of how full they are.
        assert_eq!(lines[0].find('|'), lines[1].find('|'));
    }

    #[test]
    fn test_hex_dump_empty() {
        assert!(hex_dump_lines(&[]).is_empty());
    }

    #[test]
    fn test_keepalive_matches_startup() {
        assert_eq!(Frame::keepalive(), Frame::startup());
        assert_eq!(Frame::startup().len(), 6);
    }
}
