//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Stream.
//! It orchestrates one decode → calibrate → assemble → emit cycle per
//! incoming packet. Per-packet failures are absorbed: missing modalities
//! zero-fill, sink rejections become a sticky tracked error, and `process`
//! never returns an error to its caller. The only fatal path is startup
//! configuration validation in the constructor.

use crate::calibrate;
use crate::error::StreamError;
use crate::packet::RawPacket;
use crate::registry::ChannelRegistry;
use crate::sink::{SampleSink, StreamInfo};
use crate::tracker::ErrorTracker;
use tracing::{info, trace};

/// Sticky-error id used when the outward sink rejects a sample
pub const SINK_ERROR_ID: &str = "push";

/// Stateful processor emitting one calibrated sample per packet.
///
/// Owns the channel registry, the sticky error tracker, and the sink for
/// the lifetime of a streaming session. Cycles are synchronous and never
/// overlap; a fresh processor starts a fresh session.
pub struct StreamProcessor<S: SampleSink> {
    registry: ChannelRegistry,
    tracker: ErrorTracker,
    sink: S,
    cycles: u64,
}

impl<S: SampleSink> StreamProcessor<S> {
    /// Validate the configuration, declare the stream, and start a session.
    ///
    /// Fails (fatally, before any sample flows) if the descriptor's channel
    /// count does not match the registry or if the sink refuses the
    /// declaration.
    pub fn new(registry: ChannelRegistry, info: StreamInfo, mut sink: S) -> Result<Self, StreamError> {
        if registry.is_empty() {
            return Err(StreamError::EmptyRegistry);
        }
        if info.channel_count != registry.len() {
            return Err(StreamError::ChannelCountMismatch {
                declared: info.channel_count,
                expected: registry.len(),
            });
        }
        sink.open(&info)?;
        info!(
            stream = %info.name,
            channels = registry.len(),
            rate_hz = info.sample_rate_hz,
            "stream declared"
        );
        Ok(Self {
            registry,
            tracker: ErrorTracker::new(),
            sink,
            cycles: 0,
        })
    }

    /// Run one full cycle for `packet`.
    ///
    /// Always produces a sample of registry length; modalities the packet
    /// cannot serve are zero-filled per the calibration policy. A sink
    /// rejection is reported once per session and otherwise ignored.
    pub fn process(&mut self, packet: &dyn RawPacket) {
        let mut sample = Vec::with_capacity(self.registry.len());
        for modality in self.registry.modalities() {
            calibrate::decode_into(*modality, packet, &mut self.tracker, &mut sample);
        }
        debug_assert_eq!(sample.len(), self.registry.len());

        if let Err(e) = self.sink.push(&sample) {
            self.tracker
                .report_once(SINK_ERROR_ID, &format!("failed to push sample to outlet: {e}"));
        }
        self.cycles += 1;
        trace!(cycle = self.cycles, "sample emitted");
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Sticky error state accumulated this session
    pub fn tracker(&self) -> &ErrorTracker {
        &self.tracker
    }

    /// Completed cycles, including zero-filled and sink-rejected ones
    pub fn samples_emitted(&self) -> u64 {
        self.cycles
    }

    /// Tear down the processor and recover the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}
