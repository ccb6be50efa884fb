//! Error types for Synheart Stream

use crate::sink::SinkError;
use thiserror::Error;

/// Fatal configuration errors raised before streaming begins.
///
/// Per-packet failures (missing channels, sink rejections) never surface
/// here; they are absorbed by the sticky error tracker so the stream keeps
/// flowing.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("channel registry declares no modalities")]
    EmptyRegistry,

    #[error("stream descriptor declares {declared} channels but registry provides {expected}")]
    ChannelCountMismatch { declared: usize, expected: usize },

    #[error("failed to declare stream to outlet: {0}")]
    Sink(#[from] SinkError),
}
