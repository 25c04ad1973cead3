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

//! Receiver command table.
//!
//! Maps semantic commands to the literal frames the receiver understands.

use thiserror::Error;

use crate::bluetooth::{Frame, FrameError};

/// Errors for requests that cannot be turned into a frame.
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("quick numbers must be 1-4")]
    InvalidQuick,

    #[error("available inputs: cbl, dvd, blueray, game, mediaplayer, tvaudio")]
    UnknownInput,

    #[error("available power commands: on, off")]
    UnknownPower,

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Quick select preset, 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickSelect(u8);

impl QuickSelect {
    pub fn new(preset: u8) -> Option<Self> {
        (1..=4).contains(&preset).then_some(Self(preset))
    }

    /// Parse from string. Only the bare digits 1 to 4 are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Self(1)),
            "2" => Some(Self(2)),
            "3" => Some(Self(3)),
            "4" => Some(Self(4)),
            _ => None,
        }
    }

    pub fn preset(&self) -> u8 {
        self.0
    }
}

/// Input sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    CblSat,
    Dvd,
    MediaPlayer,
    BluRay,
    Game,
    TvAudio,
}

impl InputSource {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cbl" | "cbl/sat" => Some(Self::CblSat),
            "dvd" | "dvd/blueray" | "dvd/blue-ray" => Some(Self::Dvd),
            "mp" | "mediaplayer" => Some(Self::MediaPlayer),
            "br" | "blueray" | "blue-ray" => Some(Self::BluRay),
            "g" | "game" => Some(Self::Game),
            "tv" | "tvaudio" | "tv-audio" => Some(Self::TvAudio),
            _ => None,
        }
    }

    /// Source code and checksum bytes.
    fn code(&self) -> [u8; 2] {
        match self {
            Self::CblSat => [0x52, 0xad],
            Self::Dvd => [0x53, 0xac],
            Self::MediaPlayer => [0x54, 0xab],
            Self::BluRay => [0x55, 0xaa],
            Self::Game => [0x56, 0xa9],
            Self::TvAudio => [0x57, 0xa8],
        }
    }
}

/// Power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    On,
    Off,
}

impl Power {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "on" | "1" => Some(Self::On),
            "off" | "0" => Some(Self::Off),
            _ => None,
        }
    }
}

/// A command for the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quick(QuickSelect),
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
    Input(InputSource),
    Power(Power),
    /// Caller supplied bytes, sent verbatim.
    Raw(Frame),
}

impl Command {
    pub fn quick(s: &str) -> Result<Self, CommandError> {
        QuickSelect::parse(s)
            .map(Self::Quick)
            .ok_or(CommandError::InvalidQuick)
    }

    pub fn input(s: &str) -> Result<Self, CommandError> {
        InputSource::parse(s)
            .map(Self::Input)
            .ok_or(CommandError::UnknownInput)
    }

    pub fn power(s: &str) -> Result<Self, CommandError> {
        Power::parse(s)
            .map(Self::Power)
            .ok_or(CommandError::UnknownPower)
    }

    /// Raw frame from a hex string; whitespace is ignored.
    pub fn raw(hex: &str) -> Result<Self, CommandError> {
        Ok(Self::Raw(Frame::from_hex(hex)?))
    }

    /// Encode the command as a frame.
    pub fn frame(&self) -> Frame {
        match self {
            Self::Quick(quick) => {
                let preset = quick.preset();
                Frame::new([0x41, 0x54, 0x00, 0x08, 0x02, 0x00, preset, 0xfe - preset])
            }
            Self::VolumeUp => Frame::new([0x41, 0x54, 0x07, 0x00, 0x00, 0x00]),
            Self::VolumeDown => Frame::new([0x41, 0x54, 0x07, 0x01, 0x00, 0x00]),
            Self::Mute => Frame::new([0x41, 0x54, 0x07, 0x1d, 0x01, 0x01, 0xfe]),
            Self::Unmute => Frame::new([0x41, 0x54, 0x07, 0x1d, 0x01, 0x00, 0xff]),
            Self::Input(source) => {
                let [code, checksum] = source.code();
                Frame::new([0x41, 0x54, 0x00, 0x01, 0x01, code, checksum])
            }
            Self::Power(Power::Off) => Frame::new([0x41, 0x54, 0x00, 0x0a, 0x01, 0x00, 0xff]),
            Self::Power(Power::On) => Frame::new([0x41, 0x54, 0x00, 0x0a, 0x01, 0x01, 0xfe]),
            Self::Raw(frame) => frame.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(command: Command) -> String {
        command.frame().to_hex()
    }

    #[test]
    fn test_quick_select() {
        assert_eq!(hex(Command::quick("1").unwrap()), "41540008020001fd");
        assert_eq!(hex(Command::quick("2").unwrap()), "41540008020002fc");
        assert_eq!(hex(Command::quick("3").unwrap()), "41540008020003fb");
        assert_eq!(hex(Command::quick("4").unwrap()), "41540008020004fa");
        assert_eq!(Command::quick("0"), Err(CommandError::InvalidQuick));
        assert_eq!(Command::quick("5"), Err(CommandError::InvalidQuick));
        assert_eq!(Command::quick("one"), Err(CommandError::InvalidQuick));
        for loose in ["+1", "01", "004", " 2 ", ""] {
            assert_eq!(Command::quick(loose), Err(CommandError::InvalidQuick));
        }
        assert_eq!(QuickSelect::new(2).map(|q| q.preset()), Some(2));
        assert_eq!(QuickSelect::new(5), None);
    }

    #[test]
    fn test_fixed_commands() {
        assert_eq!(hex(Command::VolumeUp), "415407000000");
        assert_eq!(hex(Command::VolumeDown), "415407010000");
        assert_eq!(hex(Command::Mute), "4154071d0101fe");
        assert_eq!(hex(Command::Unmute), "4154071d0100ff");
    }

    #[test]
    fn test_input_parse() {
        assert_eq!(InputSource::parse("DVD"), Some(InputSource::Dvd));
        assert_eq!(InputSource::parse("dvd/Blue-Ray"), Some(InputSource::Dvd));
        assert_eq!(InputSource::parse("cbl/sat"), Some(InputSource::CblSat));
        assert_eq!(InputSource::parse("MP"), Some(InputSource::MediaPlayer));
        assert_eq!(InputSource::parse("blueray"), Some(InputSource::BluRay));
        assert_eq!(InputSource::parse("g"), Some(InputSource::Game));
        assert_eq!(InputSource::parse("tv-audio"), Some(InputSource::TvAudio));
        assert_eq!(InputSource::parse("vcr"), None);
    }

    #[test]
    fn test_input_frames() {
        assert_eq!(hex(Command::input("cbl").unwrap()), "415400010152ad");
        assert_eq!(hex(Command::input("dvd").unwrap()), "415400010153ac");
        assert_eq!(hex(Command::input("mediaplayer").unwrap()), "415400010154ab");
        assert_eq!(hex(Command::input("br").unwrap()), "415400010155aa");
        assert_eq!(hex(Command::input("game").unwrap()), "415400010156a9");
        assert_eq!(hex(Command::input("tv").unwrap()), "415400010157a8");
        assert_eq!(
            Command::input("DVD").unwrap().frame(),
            Command::input("dvd").unwrap().frame()
        );
        assert_eq!(Command::input("radio"), Err(CommandError::UnknownInput));
    }

    #[test]
    fn test_power() {
        assert_eq!(hex(Command::power("on").unwrap()), "4154000a0101fe");
        assert_eq!(hex(Command::power("1").unwrap()), "4154000a0101fe");
        assert_eq!(hex(Command::power("OFF").unwrap()), "4154000a0100ff");
        assert_eq!(hex(Command::power("0").unwrap()), "4154000a0100ff");
        assert_eq!(Command::power("standby"), Err(CommandError::UnknownPower));
    }

    #[test]
    fn test_raw() {
        let command = Command::raw("41 54 00 0a 01 01 fe").unwrap();
        assert_eq!(hex(command), "4154000a0101fe");
        assert!(matches!(
            Command::raw("41 5g"),
            Err(CommandError::Frame(FrameError::InvalidHex(_)))
        ));
        assert_eq!(
            Command::raw(" \n"),
            Err(CommandError::Frame(FrameError::Empty))
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(CommandError::InvalidQuick.to_string(), "quick numbers must be 1-4");
        assert_eq!(
            CommandError::UnknownPower.to_string(),
            "available power commands: on, off"
        );
    }
}
