//! The seam between the reporter and the wire.
//!
//! A [`StreamTransport`] knows how to open one bidirectional stream to the
//! collector. Each open stream is represented by a [`StreamConnection`]:
//! frames go out through a bounded channel, and everything the transport's
//! observer sees comes back as [`StreamEvent`]s on another channel, so the
//! reporter task consumes them in its own execution context instead of
//! racing the transport's I/O threads.

use async_trait::async_trait;
use log::warn;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{ReporterError, Result};
use crate::source::Report;

#[cfg(feature = "grpc")]
pub mod grpc;

/// Frames pushed on an open stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame<R> {
    /// A usage report
    Report(R),
    /// An idle-channel probe; the transport renders it in whatever form
    /// the protocol reserves for keepalives
    Keepalive,
}

/// Events surfaced by a stream's observer
#[derive(Debug)]
pub enum StreamEvent {
    /// Acknowledgement from the collector. Ignored by policy.
    Ack,
    /// The stream failed; classification decides whether a reconnect is
    /// worth scheduling
    Error(ReporterError),
    /// The collector ended the stream. Not expected in normal operation.
    Closed,
}

/// Ownership of exactly one active stream to the collector.
///
/// Dropping the connection closes the outbound half and detaches the
/// observer; the reporter replaces the whole connection on reconnect.
pub struct StreamConnection<R> {
    outbound: mpsc::Sender<StreamFrame<R>>,
    /// Observer events, consumed by the reporter task
    pub events: mpsc::Receiver<StreamEvent>,
    id: Uuid,
}

impl<R: Report> StreamConnection<R> {
    pub fn new(
        outbound: mpsc::Sender<StreamFrame<R>>,
        events: mpsc::Receiver<StreamEvent>,
    ) -> Self {
        Self {
            outbound,
            events,
            id: Uuid::new_v4(),
        }
    }

    /// Identifier for log correlation across a stream's lifetime
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Push a report, fire-and-forget.
    ///
    /// Never blocks the scheduling task. A full outbound buffer drops the
    /// frame: reports are last-value snapshots and the next sample (or the
    /// post-reconnect resend) supersedes anything dropped. Pushing on a
    /// closed stream returns an error, but the authoritative failure still
    /// arrives through the observer as a [`StreamEvent`].
    pub fn push(&self, report: R) -> Result<()> {
        self.send_frame(StreamFrame::Report(report))
    }

    /// Push an idle-channel probe.
    pub fn keepalive(&self) -> Result<()> {
        self.send_frame(StreamFrame::Keepalive)
    }

    fn send_frame(&self, frame: StreamFrame<R>) -> Result<()> {
        use tokio::sync::mpsc::error::TrySendError;

        match self.outbound.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("stream {}: outbound buffer full, dropping frame", self.id);
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(ReporterError::Transport(format!(
                "stream {}: outbound half closed",
                self.id
            ))),
        }
    }
}

/// Trait for transports that can open streams to the collector
#[async_trait]
pub trait StreamTransport: Send + Sync + 'static {
    /// The report type this transport carries
    type Report: Report;

    /// Open a fresh stream, registering its observer.
    ///
    /// A synchronous failure here is handled by the caller's reconnect
    /// policy; errors after the stream is up arrive as [`StreamEvent`]s.
    async fn open(&self) -> Result<StreamConnection<Self::Report>>;
}
