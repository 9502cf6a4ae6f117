//! Async JSON-over-TCP client for a single Yeelight lamp.
//!
//! By default every request opens its own connection, matching how the lamp
//! firmware is usually driven. Persistent mode keeps one connection and
//! reopens it after any I/O failure or missed response.

use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::protocol::{LampCommand, Response};

/// Yeelight LAN control port.
pub const DEFAULT_PORT: u16 = 55443;

/// Default connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;

/// Default wait for a reply in milliseconds.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 500;

/// Async client for one lamp.
#[derive(Debug)]
pub struct YeelightClient {
    address: String,
    connect_timeout: Duration,
    response_timeout: Duration,
    persistent: bool,
    connection: Mutex<Option<BufReader<TcpStream>>>,
}

impl YeelightClient {
    /// Create a client for `address` (`host` or `host:port`). Nothing is
    /// opened until the first request.
    pub fn new(address: &str) -> Self {
        let address = if address.contains(':') {
            address.to_string()
        } else {
            format!("{}:{}", address, DEFAULT_PORT)
        };
        Self {
            address,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            persistent: false,
            connection: Mutex::new(None),
        }
    }

    /// Override the connect and response timeouts.
    pub fn with_timeouts(mut self, connect: Duration, response: Duration) -> Self {
        self.connect_timeout = connect;
        self.response_timeout = response;
        self
    }

    /// Keep the connection open between requests.
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// `host:port` in use.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether the connection is reused.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Send one command and wait for its reply.
    ///
    /// # Returns
    /// * `Ok(Some(response))` when the lamp answered with a result
    /// * `Ok(None)` when no reply arrived within the response timeout
    /// * `Err` on connect or I/O failure, or when the lamp answered with an
    ///   error object
    pub async fn send(&self, command: &LampCommand) -> Result<Option<Response>> {
        let request = command.to_request(next_request_id());
        let line = request
            .to_line()
            .with_context(|| format!("Failed to encode '{}'", request.method))?;

        // Held for the whole exchange so requests never interleave.
        let mut connection = self.connection.lock().await;
        let mut stream = match connection.take() {
            Some(stream) => stream,
            None => self.open().await?,
        };

        tracing::debug!(method = request.method, id = request.id, "Yeelight request");
        let outcome = self
            .exchange(&mut stream, &line, request.id, request.method)
            .await;

        // Partial reads after a timeout would desync the stream, so only a
        // clean answer keeps the connection.
        if self.persistent && matches!(outcome, Ok(Some(_))) {
            *connection = Some(stream);
        }

        match outcome? {
            Some(Response {
                error: Some(error), ..
            }) => anyhow::bail!(
                "Lamp rejected '{}': {} (code {})",
                request.method,
                error.message,
                error.code
            ),
            reply => Ok(reply),
        }
    }

    /// Drop the persistent connection, if any.
    pub async fn disconnect(&self) {
        if self.connection.lock().await.take().is_some() {
            tracing::debug!("Closed connection to {}", self.address);
        }
    }

    async fn open(&self) -> Result<BufReader<TcpStream>> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .with_context(|| format!("Connection timeout to {}", self.address))?
            .with_context(|| format!("Failed to connect to {}", self.address))?;

        stream.set_nodelay(true)?;
        tracing::debug!("Connected to Yeelight at {}", self.address);
        Ok(BufReader::new(stream))
    }

    async fn exchange(
        &self,
        stream: &mut BufReader<TcpStream>,
        line: &str,
        id: i32,
        method: &str,
    ) -> Result<Option<Response>> {
        stream
            .get_mut()
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to write '{}'", method))?;
        stream
            .get_mut()
            .flush()
            .await
            .context("Failed to flush stream")?;

        match timeout(self.response_timeout, read_response(stream, id)).await {
            Ok(result) => result.map(Some),
            Err(_) => {
                tracing::debug!(
                    method,
                    "No reply within {:?}, assuming the lamp applied it",
                    self.response_timeout
                );
                Ok(None)
            }
        }
    }
}

/// Read lines until the reply carrying `id` shows up.
async fn read_response(stream: &mut BufReader<TcpStream>, id: i32) -> Result<Response> {
    loop {
        let mut line = String::new();
        let read = stream
            .read_line(&mut line)
            .await
            .context("Failed to read response")?;
        if read == 0 {
            anyhow::bail!("Connection closed by lamp");
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let response: Response = serde_json::from_str(trimmed)
            .with_context(|| format!("Malformed reply from lamp: {}", trimmed))?;

        match response.id {
            Some(reply_id) if reply_id == i64::from(id) => {
                tracing::debug!("Yeelight response: {}", trimmed);
                return Ok(response);
            }
            Some(reply_id) => tracing::debug!(reply_id, "Skipping stale reply"),
            None => tracing::trace!("Skipping notification: {}", trimmed),
        }
    }
}

fn next_request_id() -> i32 {
    rand::thread_rng().gen_range(1..=i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_the_default_port() {
        assert_eq!(YeelightClient::new("192.168.1.20").address(), "192.168.1.20:55443");
        assert_eq!(YeelightClient::new("lamp.local:1234").address(), "lamp.local:1234");
    }

    #[test]
    fn request_ids_are_positive() {
        for _ in 0..1000 {
            assert!(next_request_id() > 0);
        }
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = YeelightClient::new(&addr.to_string());
        let err = client.send(&LampCommand::Toggle).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to connect"));
    }
}
