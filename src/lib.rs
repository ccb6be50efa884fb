//! Synheart Stream - On-device streaming engine for calibrated biosensor samples
//!
//! Stream turns raw multi-modal biosensor packets into fixed-order calibrated
//! samples through a deterministic per-packet cycle: packet decode →
//! calibration → sample assembly → emission to a declared outlet.
//!
//! ## Modules
//!
//! - **packet**: closed channel-tag set and raw packet access
//! - **calibrate**: raw-to-physical-unit conversion and per-modality policy
//! - **registry**: ordered output channel catalogue
//! - **tracker**: sticky once-per-session error reporting
//! - **sink**: outward stream descriptor and sample sinks
//! - **pipeline**: the `StreamProcessor` driving one cycle per packet

pub mod calibrate;
pub mod error;
pub mod packet;
pub mod pipeline;
pub mod registry;
pub mod sink;
pub mod tracker;

pub use error::StreamError;
pub use packet::{ChannelTag, RawPacket, ReadError, TaggedPacket};
pub use pipeline::StreamProcessor;
pub use registry::{ChannelRegistry, ChannelSpec, Modality};
pub use sink::{
    JsonLineSink, SampleFormat, SampleSink, SinkError, StreamInfo, DEFAULT_SAMPLE_RATE_HZ,
};
pub use tracker::ErrorTracker;

/// Stream version embedded in declared stream descriptors
pub const STREAM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for declared stream descriptors
pub const PRODUCER_NAME: &str = "synheart-stream";
