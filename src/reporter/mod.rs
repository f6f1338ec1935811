//! The resilient streaming reporter.
//!
//! A [`StreamReporter`] owns one logical stream to the collector, samples
//! its [`ReportSource`](crate::source::ReportSource) on a fixed period,
//! pushes each snapshot, and recovers from transport faults with a delayed
//! reconnect that replays the last report it sent. It is constructed once,
//! started once and shut down once; after shutdown it stays inert.

mod task;

use log::debug;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::ReportingConfig;
use crate::error::{ReporterError, Result};
use crate::reconnect::ReconnectPolicy;
use crate::source::ReportSource;
use crate::transport::StreamTransport;
use task::{Command, ReporterTask};

enum Lifecycle {
    Idle,
    Running {
        commands: mpsc::Sender<Command>,
        task: JoinHandle<()>,
    },
    Terminated,
}

/// Periodic telemetry reporter with autonomous stream recovery
pub struct StreamReporter<S, T>
where
    S: ReportSource,
    T: StreamTransport<Report = S::Report>,
{
    source: Arc<S>,
    transport: Arc<T>,
    config: ReportingConfig,
    policy: ReconnectPolicy,
    lifecycle: Mutex<Lifecycle>,
}

impl<S, T> StreamReporter<S, T>
where
    S: ReportSource,
    T: StreamTransport<Report = S::Report>,
{
    /// Create a new reporter. The reconnect policy is derived from the
    /// reporting schedule; see [`with_policy`](Self::with_policy) to
    /// replace it.
    pub fn new(transport: T, source: S, config: ReportingConfig) -> Self {
        let policy = config.reconnect_policy();

        Self {
            source: Arc::new(source),
            transport: Arc::new(transport),
            config,
            policy,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Replace the reconnect policy derived from the config.
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Open the first stream and arm the periodic timers.
    ///
    /// Resolves once the first open attempt has completed. A transport
    /// failure on that attempt is not a start error; it enters the
    /// reconnect loop like any later fault. Starting twice, or after
    /// shutdown, is a lifecycle error.
    pub async fn start(&self) -> Result<()> {
        let (started_tx, started_rx) = oneshot::channel();

        {
            let mut lifecycle = self.lifecycle.lock().await;
            match &*lifecycle {
                Lifecycle::Idle => {}
                Lifecycle::Running { .. } => {
                    return Err(ReporterError::Lifecycle("reporter already started".into()));
                }
                Lifecycle::Terminated => {
                    return Err(ReporterError::Lifecycle(
                        "reporter has been shut down".into(),
                    ));
                }
            }

            let (command_tx, command_rx) = mpsc::channel(4);
            let reporter = ReporterTask {
                source: Arc::clone(&self.source),
                transport: Arc::clone(&self.transport),
                config: self.config.clone(),
                policy: self.policy.clone(),
                commands: command_rx,
                last_sent: None,
                failed_attempts: 0,
            };

            let task = tokio::spawn(reporter.run(started_tx));
            *lifecycle = Lifecycle::Running {
                commands: command_tx,
                task,
            };
        }

        let _ = started_rx.await;
        Ok(())
    }

    /// Cancel all timers, close the stream if one is open and leave the
    /// reporter permanently inert. Safe to call in any state, any number
    /// of times.
    pub async fn shutdown(&self) -> Result<()> {
        let running = {
            let mut lifecycle = self.lifecycle.lock().await;
            match std::mem::replace(&mut *lifecycle, Lifecycle::Terminated) {
                Lifecycle::Running { commands, task } => Some((commands, task)),
                Lifecycle::Idle | Lifecycle::Terminated => None,
            }
        };

        if let Some((commands, task)) = running {
            let (ack_tx, ack_rx) = oneshot::channel();
            if commands.send(Command::Shutdown(ack_tx)).await.is_ok() {
                let _ = ack_rx.await;
            }
            let _ = task.await;
            debug!("reporter terminated");
        }

        Ok(())
    }
}
