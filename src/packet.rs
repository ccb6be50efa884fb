//! Raw packet access
//!
//! This module defines the closed set of raw channel tags the engine knows
//! how to decode, and the `RawPacket` trait through which one incoming
//! device packet is read. A missing tag is a recoverable, per-reading
//! condition (`ReadError::NotFound`); which tags make up a modality and
//! what to do when one is absent is decided by the calibration layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Raw channel tags supported by the engine.
///
/// Adding or removing a sensor is a compile-time change: every place that
/// maps tags to modalities matches exhaustively on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelTag {
    GsrRaw,
    Ppg,
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
    MagX,
    MagY,
    MagZ,
    Battery,
}

impl ChannelTag {
    /// All supported tags, in decode order
    pub const ALL: [ChannelTag; 12] = [
        ChannelTag::GsrRaw,
        ChannelTag::Ppg,
        ChannelTag::AccelX,
        ChannelTag::AccelY,
        ChannelTag::AccelZ,
        ChannelTag::GyroX,
        ChannelTag::GyroY,
        ChannelTag::GyroZ,
        ChannelTag::MagX,
        ChannelTag::MagY,
        ChannelTag::MagZ,
        ChannelTag::Battery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelTag::GsrRaw => "gsr_raw",
            ChannelTag::Ppg => "ppg",
            ChannelTag::AccelX => "accel_x",
            ChannelTag::AccelY => "accel_y",
            ChannelTag::AccelZ => "accel_z",
            ChannelTag::GyroX => "gyro_x",
            ChannelTag::GyroY => "gyro_y",
            ChannelTag::GyroZ => "gyro_z",
            ChannelTag::MagX => "mag_x",
            ChannelTag::MagY => "mag_y",
            ChannelTag::MagZ => "mag_z",
            ChannelTag::Battery => "battery",
        }
    }
}

impl fmt::Display for ChannelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to read a single raw channel from a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("channel {0} not present in packet")]
    NotFound(ChannelTag),
}

/// One incoming device packet, read-only for the duration of a cycle.
///
/// Implementors make no promise about which tags are present; a device
/// configured without a sensor simply never carries its tags.
pub trait RawPacket {
    /// Read the raw integer value for `tag`
    fn read(&self, tag: ChannelTag) -> Result<i32, ReadError>;

    /// Capability query: does this packet carry `tag`?
    fn has(&self, tag: ChannelTag) -> bool {
        self.read(tag).is_ok()
    }
}

/// Tag-keyed packet used by the streaming CLI and by tests.
///
/// Serializes as a flat JSON object, one key per tag:
/// `{"gsr_raw": 35000, "accel_x": 2048, ...}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaggedPacket {
    readings: HashMap<ChannelTag, i32>,
}

impl TaggedPacket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw value for `tag`, replacing any previous value
    pub fn set(&mut self, tag: ChannelTag, raw: i32) {
        self.readings.insert(tag, raw);
    }

    /// Builder-style `set`
    pub fn with(mut self, tag: ChannelTag, raw: i32) -> Self {
        self.set(tag, raw);
        self
    }

    /// Remove a tag, as if the device were configured without it
    pub fn clear(&mut self, tag: ChannelTag) {
        self.readings.remove(&tag);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl RawPacket for TaggedPacket {
    fn read(&self, tag: ChannelTag) -> Result<i32, ReadError> {
        self.readings
            .get(&tag)
            .copied()
            .ok_or(ReadError::NotFound(tag))
    }

    fn has(&self, tag: ChannelTag) -> bool {
        self.readings.contains_key(&tag)
    }
}
