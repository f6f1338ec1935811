//! The reporter's scheduling task.
//!
//! Everything that can touch reporter state (timer fires, stream events,
//! shutdown) is funneled into one [`Event`] per loop iteration and
//! processed strictly in arrival order on this task. The state enum holds
//! the periodic timers only while a stream is up and the reconnect timer
//! only while one is pending, so the two can never coexist.

use log::{debug, info, trace, warn};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Interval, Sleep};

use crate::config::ReportingConfig;
use crate::reconnect::ReconnectPolicy;
use crate::source::{Report, ReportSource};
use crate::transport::{StreamConnection, StreamEvent, StreamTransport};

pub(crate) enum Command {
    Shutdown(oneshot::Sender<()>),
}

/// The scheduler's event alphabet; one of these is handled per iteration.
enum Event {
    Command(Option<Command>),
    Stream(Option<StreamEvent>),
    SampleDue,
    KeepaliveDue,
    ReconnectDue,
}

enum State<R: Report> {
    Streaming {
        conn: StreamConnection<R>,
        sample: Interval,
        keepalive: Interval,
        /// Cleared once the observer hung up, so a closed channel is not
        /// polled in a loop
        events_open: bool,
        /// Whether any frame went out since the last keepalive tick
        active: bool,
    },
    AwaitingReconnect {
        retry: Pin<Box<Sleep>>,
    },
}

pub(crate) struct ReporterTask<S, T>
where
    S: ReportSource,
    T: StreamTransport<Report = S::Report>,
{
    pub(crate) source: Arc<S>,
    pub(crate) transport: Arc<T>,
    pub(crate) config: ReportingConfig,
    pub(crate) policy: ReconnectPolicy,
    pub(crate) commands: mpsc::Receiver<Command>,
    pub(crate) last_sent: Option<S::Report>,
    pub(crate) failed_attempts: u32,
}

impl<S, T> ReporterTask<S, T>
where
    S: ReportSource,
    T: StreamTransport<Report = S::Report>,
{
    pub(crate) async fn run(mut self, started: oneshot::Sender<()>) {
        let mut state = match self.transport.open().await {
            Ok(conn) => {
                info!("{}: stream {} established", self.source.name(), conn.id());
                self.streaming(conn, false)
            }
            Err(err) => {
                warn!("{}: failed to open stream: {}", self.source.name(), err);
                self.awaiting_reconnect()
            }
        };
        let _ = started.send(());

        loop {
            let event = match &mut state {
                State::Streaming {
                    conn,
                    sample,
                    keepalive,
                    events_open,
                    ..
                } => {
                    tokio::select! {
                        biased;
                        cmd = self.commands.recv() => Event::Command(cmd),
                        ev = conn.events.recv(), if *events_open => Event::Stream(ev),
                        _ = sample.tick() => Event::SampleDue,
                        _ = keepalive.tick() => Event::KeepaliveDue,
                    }
                }
                State::AwaitingReconnect { retry } => {
                    tokio::select! {
                        biased;
                        cmd = self.commands.recv() => Event::Command(cmd),
                        _ = retry.as_mut() => Event::ReconnectDue,
                    }
                }
            };

            match event {
                Event::SampleDue => {
                    if let State::Streaming { conn, active, .. } = &mut state {
                        if self.sample(conn) {
                            *active = true;
                        }
                    }
                }
                Event::KeepaliveDue => {
                    if let State::Streaming { conn, active, .. } = &mut state {
                        if !*active {
                            trace!("stream {}: idle, sending keepalive", conn.id());
                            if let Err(err) = conn.keepalive() {
                                debug!("stream {}: keepalive not sent: {}", conn.id(), err);
                            }
                        }
                        *active = false;
                    }
                }
                Event::Stream(Some(StreamEvent::Ack)) => {
                    trace!("collector acknowledged report");
                }
                Event::Stream(Some(StreamEvent::Closed)) => {
                    debug!("collector closed the stream");
                }
                Event::Stream(Some(StreamEvent::Error(err))) if err.is_transport() => {
                    warn!("{}: stream failed: {}", self.source.name(), err);
                    state = self.awaiting_reconnect();
                }
                Event::Stream(Some(StreamEvent::Error(err))) => {
                    // Rejection: reconnecting would repeat it
                    warn!("{}: {}", self.source.name(), err);
                }
                Event::Stream(None) => {
                    if let State::Streaming { events_open, .. } = &mut state {
                        *events_open = false;
                    }
                }
                Event::ReconnectDue => match self.transport.open().await {
                    Ok(conn) => {
                        info!(
                            "{}: stream {} re-established after {} attempt(s)",
                            self.source.name(),
                            conn.id(),
                            self.failed_attempts
                        );
                        self.failed_attempts = 0;

                        let mut resent = false;
                        if let Some(report) = self.last_sent.clone() {
                            debug!("stream {}: resending last report", conn.id());
                            match conn.push(report) {
                                Ok(()) => resent = true,
                                Err(err) => {
                                    debug!("stream {}: resend failed: {}", conn.id(), err)
                                }
                            }
                        }
                        state = self.streaming(conn, resent);
                    }
                    Err(err) => {
                        warn!("{}: reconnect failed: {}", self.source.name(), err);
                        state = self.awaiting_reconnect();
                    }
                },
                Event::Command(Some(Command::Shutdown(ack))) => {
                    // Dropping the state cancels whichever timers are armed
                    // and closes the stream if one is open
                    drop(state);
                    debug!("{}: reporter shut down", self.source.name());
                    let _ = ack.send(());
                    return;
                }
                Event::Command(None) => {
                    debug!("{}: reporter handle dropped, stopping", self.source.name());
                    return;
                }
            }
        }
    }

    /// Snapshot the source and push the result. Returns whether a frame
    /// actually went out.
    fn sample(&mut self, conn: &StreamConnection<S::Report>) -> bool {
        match self.source.snapshot() {
            Some(report) => {
                self.last_sent = Some(report.clone());
                match conn.push(report) {
                    Ok(()) => debug!("stream {}: pushed report", conn.id()),
                    Err(err) => {
                        debug!("stream {}: push failed, stream error pending: {}", conn.id(), err)
                    }
                }
                true
            }
            None => {
                trace!("{}: nothing to report", self.source.name());
                false
            }
        }
    }

    /// Arm the periodic timers around a fresh stream. Both fire one full
    /// period after arming; there is no burst at open.
    fn streaming(&self, conn: StreamConnection<S::Report>, active: bool) -> State<S::Report> {
        let period = self.config.sample_period();
        let probe = self.config.keepalive_probe();

        State::Streaming {
            conn,
            sample: time::interval_at(Instant::now() + period, period),
            keepalive: time::interval_at(Instant::now() + probe, probe),
            events_open: true,
            active,
        }
    }

    /// Schedule the one-shot reconnect. Replacing the state drops any armed
    /// timers, so a reconnect can never coexist with the periodic timers or
    /// with a previously pending reconnect.
    fn awaiting_reconnect(&mut self) -> State<S::Report> {
        self.failed_attempts += 1;
        let delay = self.policy.delay(self.failed_attempts);
        debug!(
            "{}: scheduling reconnect attempt {} in {:?}",
            self.source.name(),
            self.failed_attempts,
            delay
        );

        State::AwaitingReconnect {
            retry: Box::pin(time::sleep(delay)),
        }
    }
}
