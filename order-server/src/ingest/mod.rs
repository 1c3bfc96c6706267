//! Order ingestion: message stream abstraction and the processing pipeline

pub mod pipeline;
pub mod source;

pub use pipeline::{
    IngestOutcome, IngestPipeline, PipelineError, PipelineStats, PipelineStatsSnapshot,
};
pub use source::{
    ChannelSource, CommitTicker, IngestPublisher, MessageSource, OffsetTracker, SourceError,
    StreamMessage,
};
