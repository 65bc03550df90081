use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::DigitallySignedStruct;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tracing::debug;

use crate::peer::Protocol;

/// Plain stream opens answer fast or not at all.
const STREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// QUIC gets the same tight deadline as the stream probe. quinn cancels
/// cleanly when the connect future is dropped, so there is no need for
/// the minute-long ceiling some client stacks require for dead peers.
const QUIC_TIMEOUT: Duration = Duration::from_secs(5);

impl Protocol {
    /// Attempt one connection to the peer.
    ///
    /// Returns the elapsed time to an open connection, or None when the
    /// peer did not answer in time. Errors never escape a probe; they are
    /// logged at debug level and collapse into None.
    pub async fn attempt(self, addr: IpAddr, port: u16, host: &str) -> Option<Duration> {
        match self {
            // tls peers answer a plain stream open exactly like tcp ones
            Protocol::Tcp | Protocol::Tls => probe_stream(addr, port).await,
            Protocol::Ws => probe_websocket(&format!("ws://{}", authority(addr, port))).await,
            // the advertised hostname, not the resolved address, so the
            // certificate name check matches what the peer serves
            Protocol::Wss => probe_websocket(&format!("wss://{}:{}", host, port)).await,
            Protocol::Quic => probe_quic(addr, port).await,
        }
    }
}

fn authority(addr: IpAddr, port: u16) -> String {
    match addr {
        IpAddr::V4(v4) => format!("{}:{}", v4, port),
        IpAddr::V6(v6) => format!("[{}]:{}", v6, port),
    }
}

async fn probe_stream(addr: IpAddr, port: u16) -> Option<Duration> {
    let target = SocketAddr::new(addr, port);
    let start = Instant::now();
    match timeout(STREAM_TIMEOUT, TcpStream::connect(target)).await {
        Ok(Ok(stream)) => {
            let elapsed = start.elapsed();
            drop(stream);
            Some(elapsed)
        }
        Ok(Err(e)) => {
            debug!("Connection error for {}: {}", target, e);
            None
        }
        Err(_) => {
            debug!("Connection to {} timed out", target);
            None
        }
    }
}

async fn probe_websocket(url: &str) -> Option<Duration> {
    let start = Instant::now();
    match connect_async(url).await {
        Ok((stream, _response)) => {
            let elapsed = start.elapsed();
            drop(stream);
            Some(elapsed)
        }
        Err(e) => {
            debug!("WebSocket connection error for {}: {}", url, e);
            None
        }
    }
}

async fn probe_quic(addr: IpAddr, port: u16) -> Option<Duration> {
    let target = SocketAddr::new(addr, port);
    let start = Instant::now();
    match timeout(QUIC_TIMEOUT, quic_connect(target)).await {
        Ok(Ok(())) => Some(start.elapsed()),
        Ok(Err(e)) => {
            debug!("QUIC connection error for {}: {}", target, e);
            None
        }
        Err(_) => {
            debug!("QUIC connection to {} timed out", target);
            None
        }
    }
}

async fn quic_connect(target: SocketAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bind: SocketAddr = if target.is_ipv4() {
        "0.0.0.0:0".parse()?
    } else {
        "[::]:0".parse()?
    };
    let mut endpoint = quinn::Endpoint::client(bind)?;
    endpoint.set_default_client_config(quic_client_config()?);

    let connection = endpoint
        .connect(target, &target.ip().to_string())?
        .await?;
    connection.close(0u32.into(), b"");
    endpoint.close(0u32.into(), b"");
    Ok(())
}

/// Peers are expected to serve ephemeral self-signed certificates, so
/// the QUIC probe skips certificate verification entirely.
fn quic_client_config() -> Result<quinn::ClientConfig, Box<dyn std::error::Error + Send + Sync>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let tls = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
        .with_no_client_auth();
    let quic = quinn::crypto::rustls::QuicClientConfig::try_from(tls)?;
    Ok(quinn::ClientConfig::new(Arc::new(quic)))
}

/// Accepts whatever certificate the peer presents. Signatures are still
/// checked so the handshake itself stays honest.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
