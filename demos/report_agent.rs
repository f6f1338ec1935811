// Example of a telemetry reporting agent using uplink

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Mutex;
use uplink::prelude::*;
use uplink::proto::v1::{SessionInfo, UsageReport};

/// Command line arguments for the report agent example
#[derive(Parser, Debug)]
#[command(name = "report_agent", about = "Uplink reporting agent example")]
struct Args {
    /// Path to the configuration file (required)
    #[arg(short, long)]
    config: PathBuf,

    /// Override the sample period in seconds
    #[arg(short, long)]
    period: Option<u64>,
}

// A source that pretends subscriber sessions come and go
struct DemoSessions {
    reporter_id: String,
    sessions: Mutex<Vec<SessionInfo>>,
}

impl DemoSessions {
    fn new(reporter_id: String) -> Self {
        let sessions = vec![
            SessionInfo {
                subscriber: "4790300147".to_string(),
                access_point: "panacea".to_string(),
                network: "24201".to_string(),
            },
            SessionInfo {
                subscriber: "4790300148".to_string(),
                access_point: "panacea".to_string(),
                network: "24202".to_string(),
            },
            SessionInfo {
                subscriber: "4790300149".to_string(),
                access_point: "backup".to_string(),
                network: "24201".to_string(),
            },
        ];

        Self {
            reporter_id,
            sessions: Mutex::new(sessions),
        }
    }
}

impl ReportSource for DemoSessions {
    type Report = UsageReport;

    fn snapshot(&self) -> Option<UsageReport> {
        let mut sessions = self.sessions.lock().unwrap();
        if !sessions.is_empty() {
            sessions.rotate_left(1);
        }
        Some(UsageReport::snapshot(
            self.reporter_id.clone(),
            sessions.clone(),
        ))
    }

    fn name(&self) -> &str {
        "demo-sessions"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(period) = args.period {
        config.reporting.sample_period_secs = period;
    }

    uplink::util::logging::init(&config.log_level);
    info!(
        "Starting report agent {} -> {}",
        config.collector.reporter_id, config.collector.address
    );

    let transport = GrpcTransport::new(&config.collector)?
        .with_outbound_buffer(config.reporting.outbound_buffer);
    let source = DemoSessions::new(config.collector.reporter_id.clone());
    let reporter = StreamReporter::new(transport, source, config.reporting.clone());

    reporter.start().await?;
    info!("Reporting every {}s; press Ctrl-C to stop", config.reporting.sample_period_secs);

    tokio::signal::ctrl_c().await?;
    reporter.shutdown().await?;
    info!("Report agent stopped");

    Ok(())
}
