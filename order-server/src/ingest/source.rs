//! Inbound message stream
//!
//! [`MessageSource`] is the seam between the pipeline and whatever transport
//! feeds it. [`ChannelSource`] is the in-process implementation: producers
//! publish through an [`IngestPublisher`], the pipeline reads from the source,
//! and a [`CommitTicker`] periodically commits the handled position.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One raw message read from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Position in the stream, strictly increasing per source
    pub offset: u64,
    pub payload: Vec<u8>,
    /// Unix millis at publish time
    pub received_at: i64,
}

#[derive(Debug, Error)]
pub enum SourceError {
    /// The read was interrupted by the cancellation token
    #[error("stream read canceled")]
    Canceled,

    /// Every producer is gone or the source was closed
    #[error("stream closed")]
    Closed,

    /// Bounded queue is full; the producer should retry later
    #[error("stream queue full")]
    Full,

    #[error("stream read failed: {0}")]
    Read(String),
}

/// Pull-based message stream with at-least-once delivery
#[async_trait]
pub trait MessageSource: Send {
    /// Block until the next message arrives or `cancel` fires
    async fn next(&mut self, cancel: &CancellationToken) -> Result<StreamMessage, SourceError>;

    /// Record that the message at `offset` has been processed
    ///
    /// Processed positions are committed asynchronously; a crash before the
    /// next commit redelivers them.
    fn mark_handled(&mut self, offset: u64);

    /// Release the underlying stream resource
    async fn close(&mut self) -> Result<(), SourceError>;
}

/// Handled/committed positions shared between the source and the commit ticker
///
/// Both values are "next offset to read": 0 means nothing handled yet.
#[derive(Debug, Default)]
pub struct OffsetTracker {
    handled: AtomicU64,
    committed: AtomicU64,
}

impl OffsetTracker {
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Acquire)
    }

    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Acquire)
    }

    fn mark(&self, offset: u64) {
        self.handled.fetch_max(offset + 1, Ordering::AcqRel);
    }

    /// Commit everything handled so far; returns the new position if it moved
    fn commit(&self) -> Option<u64> {
        let handled = self.handled();
        let previous = self.committed.fetch_max(handled, Ordering::AcqRel);
        (handled > previous).then_some(handled)
    }
}

/// Producer half of a [`ChannelSource`]
#[derive(Clone)]
pub struct IngestPublisher {
    tx: mpsc::Sender<StreamMessage>,
    next_offset: Arc<Mutex<u64>>,
}

impl IngestPublisher {
    /// Enqueue a raw payload, returning its assigned offset
    ///
    /// Never waits: a full queue is reported as [`SourceError::Full`].
    pub fn publish(&self, payload: Vec<u8>) -> Result<u64, SourceError> {
        // Offset assignment and enqueue happen under one lock so that channel
        // order matches offset order.
        let mut next = self.next_offset.lock();
        let offset = *next;
        let msg = StreamMessage {
            offset,
            payload,
            received_at: shared::util::now_millis(),
        };
        self.tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SourceError::Full,
            mpsc::error::TrySendError::Closed(_) => SourceError::Closed,
        })?;
        *next += 1;
        Ok(offset)
    }
}

/// Consumer half of an in-process bounded stream
pub struct ChannelSource {
    rx: mpsc::Receiver<StreamMessage>,
    offsets: Arc<OffsetTracker>,
}

impl ChannelSource {
    /// Create a bounded stream holding up to `queue_size` pending messages
    pub fn new(queue_size: usize) -> (IngestPublisher, Self) {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        let publisher = IngestPublisher {
            tx,
            next_offset: Arc::new(Mutex::new(0)),
        };
        let source = Self {
            rx,
            offsets: Arc::new(OffsetTracker::default()),
        };
        (publisher, source)
    }

    pub fn offsets(&self) -> Arc<OffsetTracker> {
        self.offsets.clone()
    }

    /// Periodic committer for this source's handled position
    pub fn commit_ticker(&self, interval: Duration) -> CommitTicker {
        CommitTicker {
            offsets: self.offsets.clone(),
            interval,
        }
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn next(&mut self, cancel: &CancellationToken) -> Result<StreamMessage, SourceError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SourceError::Canceled),
            msg = self.rx.recv() => msg.ok_or(SourceError::Closed),
        }
    }

    fn mark_handled(&mut self, offset: u64) {
        self.offsets.mark(offset);
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.rx.close();
        if let Some(position) = self.offsets.commit() {
            tracing::debug!(position, "Committed stream position on close");
        }
        Ok(())
    }
}

/// Background task committing the handled position on a fixed interval
pub struct CommitTicker {
    offsets: Arc<OffsetTracker>,
    interval: Duration,
}

impl CommitTicker {
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    if let Some(position) = self.offsets.commit() {
                        tracing::debug!(position, "Committed stream position on shutdown");
                    }
                    tracing::info!("Commit ticker stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Some(position) = self.offsets.commit() {
                        tracing::debug!(position, "Committed stream position");
                    }
                }
            }
        }
    }
}
