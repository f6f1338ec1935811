//! tonic-backed transport for the collector protocol.
//!
//! Channel construction is the fatal path: malformed trust material, an
//! un-parseable bearer token or a plaintext address fail here with
//! [`ReporterError::Setup`] and the transport is unusable. Everything after
//! construction is recoverable and surfaces through stream events.

use async_trait::async_trait;
use log::{debug, warn};
use std::fs;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tonic::metadata::MetadataValue;
use tonic::metadata::Ascii;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Status};

use super::{StreamConnection, StreamEvent, StreamFrame, StreamTransport};
use crate::config::CollectorConfig;
use crate::error::{ReporterError, Result};
use crate::proto::v1::UsageReport;
use crate::proto::v1::telemetry_collector_client::TelemetryCollectorClient;

const PEM_CERT_MARKER: &str = "-----BEGIN CERTIFICATE-----";

const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Attaches the configured bearer token to every call
#[derive(Clone)]
pub struct AuthInterceptor {
    token: Option<MetadataValue<Ascii>>,
}

impl tonic::service::Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: tonic::Request<()>) -> std::result::Result<tonic::Request<()>, Status> {
        if let Some(token) = &self.token {
            request.metadata_mut().insert("authorization", token.clone());
        }
        Ok(request)
    }
}

/// Transport that opens bidirectional report streams over gRPC
#[derive(Debug)]
pub struct GrpcTransport {
    client: TelemetryCollectorClient<InterceptedService<Channel, AuthInterceptor>>,
    reporter_id: String,
    outbound_buffer: usize,
}

impl GrpcTransport {
    /// Build the collector channel.
    ///
    /// The channel connects lazily; this only fails on misconfiguration,
    /// never on the collector being unreachable.
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let channel = Self::build_channel(config)?;

        let token = match &config.access_token {
            Some(token) => Some(
                format!("Bearer {token}")
                    .parse::<MetadataValue<Ascii>>()
                    .map_err(|e| {
                        ReporterError::Setup(format!("invalid access token: {e}"))
                    })?,
            ),
            None => None,
        };

        let client =
            TelemetryCollectorClient::with_interceptor(channel, AuthInterceptor { token });

        Ok(Self {
            client,
            reporter_id: config.reporter_id.clone(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        })
    }

    /// Override the outbound frame buffer size.
    pub fn with_outbound_buffer(mut self, size: usize) -> Self {
        self.outbound_buffer = size.max(1);
        self
    }

    fn build_channel(config: &CollectorConfig) -> Result<Channel> {
        let uri = Self::endpoint_uri(&config.address)?;

        let endpoint = Endpoint::from_shared(uri)
            .map_err(|e| {
                ReporterError::Setup(format!(
                    "invalid collector address {}: {e}",
                    config.address
                ))
            })?
            .http2_keep_alive_interval(Duration::from_secs(config.keepalive_interval_secs))
            .keep_alive_timeout(Duration::from_secs(config.keepalive_timeout_secs))
            .keep_alive_while_idle(true);

        let endpoint = endpoint
            .tls_config(Self::trust_config(config)?)
            .map_err(|e| ReporterError::Setup(format!("invalid trust material: {e}")))?;

        Ok(endpoint.connect_lazy())
    }

    /// Transport encryption is mandatory; a bare host:port gets the https
    /// scheme, anything else must already carry it.
    fn endpoint_uri(address: &str) -> Result<String> {
        if address.starts_with("https://") {
            Ok(address.to_string())
        } else if address.contains("://") {
            Err(ReporterError::Setup(format!(
                "collector channel requires transport encryption: {address}"
            )))
        } else {
            Ok(format!("https://{address}"))
        }
    }

    /// Trust anchor selection: a configured certificate file that exists is
    /// used as the anchor; a missing or unconfigured one falls back to the
    /// platform trust store. Existence is checked once, here.
    fn trust_config(config: &CollectorConfig) -> Result<ClientTlsConfig> {
        match &config.trust_cert {
            Some(path) if path.exists() => {
                let pem = fs::read(path).map_err(|e| {
                    ReporterError::Setup(format!(
                        "failed to read trust certificate {}: {e}",
                        path.display()
                    ))
                })?;

                let looks_like_pem = std::str::from_utf8(&pem)
                    .map(|s| s.contains(PEM_CERT_MARKER))
                    .unwrap_or(false);
                if !looks_like_pem {
                    return Err(ReporterError::Setup(format!(
                        "no certificate found in {}",
                        path.display()
                    )));
                }

                debug!("Using trust certificate from {}", path.display());
                Ok(ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem)))
            }
            Some(path) => {
                debug!(
                    "Trust certificate {} not found, using platform trust store",
                    path.display()
                );
                Ok(ClientTlsConfig::new().with_native_roots())
            }
            None => Ok(ClientTlsConfig::new().with_native_roots()),
        }
    }
}

/// Map a gRPC status onto the error taxonomy. Connection-level faults are
/// worth a reconnect; everything the collector decided on purpose is not.
pub(crate) fn classify_status(status: &Status) -> ReporterError {
    let detail = format!("{} ({})", status.message(), status.code());
    match status.code() {
        Code::Unavailable
        | Code::DeadlineExceeded
        | Code::Cancelled
        | Code::Aborted
        | Code::Unknown
        | Code::Internal
        | Code::DataLoss => ReporterError::Transport(detail),
        _ => ReporterError::Rejected(detail),
    }
}

#[async_trait]
impl StreamTransport for GrpcTransport {
    type Report = UsageReport;

    async fn open(&self) -> Result<StreamConnection<UsageReport>> {
        let (frame_tx, frame_rx) = mpsc::channel::<StreamFrame<UsageReport>>(self.outbound_buffer);
        let (event_tx, event_rx) = mpsc::channel::<StreamEvent>(16);

        let reporter_id = self.reporter_id.clone();
        let outbound = ReceiverStream::new(frame_rx).map(move |frame| match frame {
            StreamFrame::Report(report) => report,
            StreamFrame::Keepalive => UsageReport::keepalive(reporter_id.clone()),
        });

        let mut client = self.client.clone();
        let response = client
            .stream_reports(tonic::Request::new(outbound))
            .await
            .map_err(|status| classify_status(&status))?;
        let mut inbound = response.into_inner();

        let connection = StreamConnection::new(frame_tx, event_rx);
        let stream_id = connection.id();

        tokio::spawn(async move {
            loop {
                match inbound.message().await {
                    Ok(Some(_ack)) => {
                        if event_tx.send(StreamEvent::Ack).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = event_tx.send(StreamEvent::Closed).await;
                        break;
                    }
                    Err(status) => {
                        let error = classify_status(&status);
                        if event_tx.send(StreamEvent::Error(error)).await.is_err() {
                            warn!("stream {stream_id}: error after reporter detached: {status}");
                        }
                        break;
                    }
                }
            }
            debug!("stream {stream_id}: observer finished");
        });

        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn test_config() -> CollectorConfig {
        CollectorConfig {
            address: "collector.example.net:443".to_string(),
            access_token: None,
            trust_cert: None,
            keepalive_interval_secs: 50,
            keepalive_timeout_secs: 60,
            reporter_id: "gw-test".to_string(),
        }
    }

    #[test]
    fn bare_addresses_get_the_https_scheme() {
        let uri = GrpcTransport::endpoint_uri("collector.example.net:443").unwrap();
        assert_eq!(uri, "https://collector.example.net:443");
    }

    #[test]
    fn https_addresses_pass_through() {
        let uri = GrpcTransport::endpoint_uri("https://collector.example.net:443").unwrap();
        assert_eq!(uri, "https://collector.example.net:443");
    }

    #[test]
    fn plaintext_addresses_are_rejected() {
        let err = GrpcTransport::endpoint_uri("http://collector.example.net:80").unwrap_err();
        assert!(matches!(err, ReporterError::Setup(_)));
    }

    #[test]
    fn connection_faults_classify_as_transport() {
        assert!(classify_status(&Status::unavailable("connection reset")).is_transport());
        assert!(classify_status(&Status::deadline_exceeded("timed out")).is_transport());
        assert!(classify_status(&Status::internal("broken pipe")).is_transport());
    }

    #[test]
    fn collector_decisions_classify_as_rejections() {
        assert!(matches!(
            classify_status(&Status::unauthenticated("bad token")),
            ReporterError::Rejected(_)
        ));
        assert!(matches!(
            classify_status(&Status::invalid_argument("bad report")),
            ReporterError::Rejected(_)
        ));
        assert!(matches!(
            classify_status(&Status::resource_exhausted("slow down")),
            ReporterError::Rejected(_)
        ));
    }

    #[tokio::test]
    async fn missing_trust_certificate_falls_back_to_platform_store() {
        let mut config = test_config();
        config.trust_cert = Some(PathBuf::from("/nonexistent/collector.crt"));

        assert!(GrpcTransport::new(&config).is_ok());
    }

    #[tokio::test]
    async fn malformed_trust_certificate_fails_setup() {
        let mut file = tempfile::Builder::new().suffix(".crt").tempfile().unwrap();
        writeln!(file, "this is not a certificate").unwrap();

        let mut config = test_config();
        config.trust_cert = Some(file.path().to_path_buf());

        let err = GrpcTransport::new(&config).unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn plaintext_address_fails_setup() {
        let mut config = test_config();
        config.address = "http://collector.example.net:80".to_string();

        let err = GrpcTransport::new(&config).unwrap_err();
        assert!(err.is_fatal());
    }
}
