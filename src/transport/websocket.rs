//! Websocket connection to the node.
//!
//! The node address is given the way operators know it, as an HTTP(S) RPC
//! address. It is rewritten to the websocket endpoint before dialing:
//!
//! - `https://host:443` → `wss://host/websocket`
//! - `http://host:26657` → `ws://host:26657/websocket`
//!
//! # Example
//!
//! ```ignore
//! use txbench::transport::connect;
//!
//! let conn = connect("https://node.example:443").await?;
//! let (writer, reader) = conn.split();
//! ```

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::{FrameWriter, ReplyReader};
use crate::error::{BenchError, Result};
use crate::protocol::WireFrame;

/// Path segment of the node's websocket endpoint.
pub const CONNECTION_PATH: &str = "websocket";

/// Turn a node address into its websocket endpoint.
///
/// `https` becomes `wss`, `http` becomes `ws` (websocket schemes are kept),
/// and [`CONNECTION_PATH`] is appended to the path.
///
/// # Errors
///
/// Returns an error if the address does not parse or uses another scheme.
pub fn endpoint_url(addr: &str) -> Result<Url> {
    let mut url = Url::parse(addr.trim())?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        _ => {
            return Err(BenchError::InvalidEndpoint(
                addr.to_string(),
                "expected an http, https, ws or wss address",
            ))
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| BenchError::InvalidEndpoint(addr.to_string(), "cannot switch scheme"))?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| BenchError::InvalidEndpoint(addr.to_string(), "address has no path"))?;
        segments.pop_if_empty().push(CONNECTION_PATH);
    }

    Ok(url)
}

/// Open the websocket connection for `addr`.
///
/// There is no retry: failing to connect ends the run.
pub async fn connect(addr: &str) -> Result<Connection<MaybeTlsStream<TcpStream>>> {
    let url = endpoint_url(addr)?;
    tracing::debug!("Connecting to {}", url);

    // `wss` endpoints need a process-level rustls provider. Fails harmlessly
    // when one is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let (ws, _response) = connect_async(url.as_str())
        .await
        .map_err(|source| BenchError::Connect {
            url: url.to_string(),
            source,
        })?;

    tracing::info!("Connected to {}", url);
    Ok(Connection::new(ws))
}

/// An open websocket connection.
///
/// The connection owns the socket; dropping it (or both of its halves)
/// releases the socket on every exit path. Call [`Connection::split`] to hand
/// the two directions to separate tasks.
pub struct Connection<S> {
    ws: WebSocketStream<S>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap an already negotiated websocket stream.
    pub fn new(ws: WebSocketStream<S>) -> Self {
        Self { ws }
    }

    /// Split into an exclusive writer and an exclusive reader.
    pub fn split(self) -> (WsWriter<S>, WsReader<S>) {
        let (sink, stream) = self.ws.split();
        (WsWriter { sink }, WsReader { stream })
    }
}

/// Write half of a websocket connection.
pub struct WsWriter<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
}

impl<S> FrameWriter for WsWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn write_frame(&mut self, frame: &WireFrame) -> Result<()> {
        self.sink.send(Message::Text(frame.text())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

/// Read half of a websocket connection.
pub struct WsReader<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

impl<S> ReplyReader for WsReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_reply(&mut self) -> Result<Bytes> {
        loop {
            match self.stream.next().await {
                Some(Ok(msg @ (Message::Text(_) | Message::Binary(_)))) => {
                    return Ok(msg.into_data())
                }
                Some(Ok(Message::Close(_))) | None => return Err(BenchError::ConnectionClosed),
                // Control frames carry no reply.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }
}
