//! Protobuf messages and gRPC client for the collector protocol.
//!
//! Generated by `tonic-prost-build` via `scripts/regenerate-protos.sh`;
//! the output is committed so builds do not require protoc.

/// Collector protocol, version 1
pub mod v1 {
    #![allow(clippy::all)]
    #![allow(warnings)]
    include!("generated/uplink.v1.rs");
}

use chrono::Utc;

impl v1::UsageReport {
    /// A report snapshot with the generation timestamp stamped now.
    pub fn snapshot(
        reporter_id: impl Into<String>,
        sessions: Vec<v1::SessionInfo>,
    ) -> Self {
        Self {
            active_sessions: sessions.len() as u32,
            sessions,
            keep_alive: false,
            reporter_id: reporter_id.into(),
            generated_at_ms: Utc::now().timestamp_millis() as u64,
        }
    }

    /// An empty report sent only to keep an idle stream warm.
    pub fn keepalive(reporter_id: impl Into<String>) -> Self {
        Self {
            active_sessions: 0,
            sessions: Vec::new(),
            keep_alive: true,
            reporter_id: reporter_id.into(),
            generated_at_ms: Utc::now().timestamp_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::v1::{SessionInfo, UsageReport};

    #[test]
    fn snapshot_counts_sessions() {
        let report = UsageReport::snapshot(
            "gw-1",
            vec![
                SessionInfo {
                    subscriber: "4790300147".to_string(),
                    access_point: "panacea".to_string(),
                    network: "24201".to_string(),
                },
                SessionInfo {
                    subscriber: "4790300148".to_string(),
                    access_point: "panacea".to_string(),
                    network: "24201".to_string(),
                },
            ],
        );

        assert_eq!(report.active_sessions, 2);
        assert!(!report.keep_alive);
        assert_eq!(report.reporter_id, "gw-1");
        assert!(report.generated_at_ms > 0);
    }

    #[test]
    fn keepalive_is_empty_and_flagged() {
        let report = UsageReport::keepalive("gw-1");
        assert!(report.keep_alive);
        assert_eq!(report.active_sessions, 0);
        assert!(report.sessions.is_empty());
    }
}
