//! Transport contracts, request framing, and the default TCP/TLS implementation.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use go2web_core::Error;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use super::url::Target;

/// Trait-object-safe stream returned by [`Transport::connect`].
pub trait IoStream: Read + Write {}
impl<T> IoStream for T where T: Read + Write {}

pub type BoxedIoStream = Box<dyn IoStream>;

/// Opens byte streams to a host, plaintext or TLS.
pub trait Transport {
    fn connect(&self, host: &str, port: u16, secure: bool) -> Result<BoxedIoStream, Error>;
}

/// Standard library TCP transport with rustls for `https`.
///
/// Without a timeout every connect, read and write blocks until the peer
/// responds or closes.
#[derive(Clone)]
pub struct NetTransport {
    timeout: Option<Duration>,
    tls: Arc<ClientConfig>,
}

impl NetTransport {
    /// Build a transport trusting the bundled webpki root certificates.
    pub fn new(timeout: Option<Duration>) -> Result<Self, Error> {
        Ok(Self { timeout, tls: Arc::new(tls_config()?) })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn connect_tcp(&self, host: &str, port: u16) -> Result<TcpStream, Error> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| Error::Transport(format!("failed to resolve `{host}`: {e}")))?
            .collect();

        if addrs.is_empty() {
            return Err(Error::Transport(format!("no addresses found for `{host}`")));
        }

        let mut last_error = None;
        for address in &addrs {
            let attempt = match self.timeout {
                Some(timeout) => TcpStream::connect_timeout(address, timeout),
                None => TcpStream::connect(address),
            };
            match attempt {
                Ok(stream) => {
                    self.configure(&stream, address)?;
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(%address, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(Error::Transport(format!("failed to connect to `{host}:{port}`: {reason}")))
    }

    fn configure(&self, stream: &TcpStream, address: &SocketAddr) -> Result<(), Error> {
        stream
            .set_read_timeout(self.timeout)
            .map_err(|e| Error::Transport(format!("failed to set read timeout for `{address}`: {e}")))?;
        stream
            .set_write_timeout(self.timeout)
            .map_err(|e| Error::Transport(format!("failed to set write timeout for `{address}`: {e}")))?;
        Ok(())
    }

    fn wrap_tls(&self, mut stream: TcpStream, host: &str) -> Result<BoxedIoStream, Error> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| Error::Transport(format!("invalid TLS server name `{host}`: {e}")))?;

        let mut connection = ClientConnection::new(self.tls.clone(), server_name)
            .map_err(|e| Error::Transport(format!("failed to initialize TLS connection for `{host}`: {e}")))?;

        connection
            .complete_io(&mut stream)
            .map_err(|e| Error::Transport(format!("TLS handshake failed for `{host}`: {e}")))?;

        Ok(Box::new(StreamOwned::new(connection, stream)))
    }
}

impl Transport for NetTransport {
    fn connect(&self, host: &str, port: u16, secure: bool) -> Result<BoxedIoStream, Error> {
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let stream = self.connect_tcp(host, port)?;
        if secure { self.wrap_tls(stream, host) } else { Ok(Box::new(stream)) }
    }
}

fn tls_config() -> Result<ClientConfig, Error> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Transport(format!("failed to configure TLS protocol versions: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(config)
}

/// Frame a `GET` request for `target`.
pub fn build_request(target: &Target, user_agent: &str, accept: &str) -> String {
    format!(
        "GET {path} HTTP/1.1\r\nHost: {host}\r\nUser-Agent: {user_agent}\r\nAccept: {accept}\r\nConnection: close\r\n\r\n",
        path = target.request_path(),
        host = target.host(),
    )
}

/// Write `request` and read the stream until the peer closes it.
///
/// A TLS peer that closes without `close_notify` after sending data is
/// treated as a normal end of stream.
pub fn exchange(stream: &mut dyn IoStream, request: &[u8]) -> Result<Vec<u8>, Error> {
    stream
        .write_all(request)
        .and_then(|()| stream.flush())
        .map_err(|e| Error::Transport(format!("failed to send request: {e}")))?;

    let mut raw = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof && !raw.is_empty() => break,
            Err(e) => return Err(Error::Transport(format!("failed to read response: {e}"))),
        }
    }

    Ok(raw)
}
