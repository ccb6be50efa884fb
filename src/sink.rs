//! Outward sample sink
//!
//! This module defines the boundary to the downstream real-time consumer:
//! a stream descriptor declared once at startup, the `SampleSink` trait
//! accepting one ordered sample vector per call, and an NDJSON sink used
//! by the streaming CLI. Channel metadata in the descriptor follows
//! registry order exactly; consumers map array positions to physical
//! meaning through it, so it is never reordered after declaration.

use crate::registry::ChannelRegistry;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;
use uuid::Uuid;

/// Nominal sample rate of the reference device configuration (Hz)
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 51.2;

/// Default content-type tag for declared streams
pub const DEFAULT_CONTENT_TYPE: &str = "Signals";

/// Numeric wire format of emitted samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    Float32,
    Float64,
}

impl SampleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleFormat::Float32 => "float32",
            SampleFormat::Float64 => "float64",
        }
    }
}

/// Per-channel metadata exposed to downstream consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMeta {
    pub label: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    pub unit: String,
}

/// Stream descriptor declared once before any sample flows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub name: String,
    pub content_type: String,
    pub channel_count: usize,
    pub sample_rate_hz: f64,
    pub format: SampleFormat,
    pub source_id: String,
    pub channels: Vec<ChannelMeta>,
}

impl StreamInfo {
    /// Build a descriptor for `registry` with the reference defaults and a
    /// generated source id
    pub fn new(name: impl Into<String>, registry: &ChannelRegistry) -> Self {
        let content_type = DEFAULT_CONTENT_TYPE.to_string();
        let channels = registry
            .channels()
            .iter()
            .map(|spec| ChannelMeta {
                label: spec.label.clone(),
                channel_type: content_type.clone(),
                unit: spec.unit.clone(),
            })
            .collect();
        Self {
            name: name.into(),
            content_type,
            channel_count: registry.len(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            format: SampleFormat::Float32,
            source_id: Uuid::new_v4().to_string(),
            channels,
        }
    }

    /// Override the generated source id with a stable one
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    pub fn with_sample_rate(mut self, hz: f64) -> Self {
        self.sample_rate_hz = hz;
        self
    }
}

/// Errors raised by a sink implementation
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sample rejected by outlet: {0}")]
    Rejected(String),

    #[error("outlet I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("outlet serialization failure: {0}")]
    Json(#[from] serde_json::Error),
}

/// Downstream real-time consumer.
///
/// `open` is called exactly once, before the first `push`; `push` receives
/// one sample vector of the declared length per cycle.
pub trait SampleSink {
    fn open(&mut self, info: &StreamInfo) -> Result<(), SinkError>;

    fn push(&mut self, sample: &[f64]) -> Result<(), SinkError>;
}

/// NDJSON record emitted per sample
#[derive(Serialize)]
struct SampleRecord<'a> {
    t: String,
    sample: &'a [f64],
}

/// Producer metadata included with the declared descriptor
#[derive(Serialize)]
struct ProducerMeta {
    name: &'static str,
    version: &'static str,
}

/// First NDJSON record of a stream: who is producing, and what
#[derive(Serialize)]
struct HeaderRecord<'a> {
    producer: ProducerMeta,
    stream: &'a StreamInfo,
}

/// Sink writing the stream as newline-delimited JSON: the descriptor as
/// the first record, then one timestamped record per sample.
pub struct JsonLineSink<W: Write> {
    writer: W,
    flush: bool,
    declared_len: Option<usize>,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            flush: true,
            declared_len: None,
        }
    }

    /// Control whether every record is flushed as it is written
    pub fn with_flush(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        if self.flush {
            self.writer.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> SampleSink for JsonLineSink<W> {
    fn open(&mut self, info: &StreamInfo) -> Result<(), SinkError> {
        let header = serde_json::to_string(&HeaderRecord {
            producer: ProducerMeta {
                name: crate::PRODUCER_NAME,
                version: crate::STREAM_VERSION,
            },
            stream: info,
        })?;
        self.write_line(&header)?;
        self.declared_len = Some(info.channel_count);
        Ok(())
    }

    fn push(&mut self, sample: &[f64]) -> Result<(), SinkError> {
        let declared = self
            .declared_len
            .ok_or_else(|| SinkError::Rejected("stream not declared".to_string()))?;
        if sample.len() != declared {
            return Err(SinkError::Rejected(format!(
                "sample has {} values, stream declared {declared}",
                sample.len()
            )));
        }
        let record = serde_json::to_string(&SampleRecord {
            t: Utc::now().to_rfc3339(),
            sample,
        })?;
        self.write_line(&record)
    }
}
