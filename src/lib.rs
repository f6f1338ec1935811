//! A core library for building resilient streaming telemetry reporters

pub mod config;
pub mod error;
pub mod reconnect;
pub mod reporter;
pub mod source;
pub mod transport;
pub mod util;

#[cfg(feature = "grpc")]
pub mod proto;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::config::{CollectorConfig, LogLevel, ReportingConfig, UplinkConfig, load_config};
    pub use crate::error::{ReporterError, Result};
    pub use crate::reconnect::{ReconnectPolicy, ReconnectPolicyBuilder};
    pub use crate::reporter::StreamReporter;
    pub use crate::source::{Report, ReportSource};
    #[cfg(feature = "grpc")]
    pub use crate::transport::grpc::GrpcTransport;
    pub use crate::transport::{StreamConnection, StreamEvent, StreamFrame, StreamTransport};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
