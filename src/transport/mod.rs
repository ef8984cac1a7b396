//! Transport module - the single duplex connection to the node.
//!
//! The pipeline never touches the websocket directly. It talks to the two
//! halves of the connection through [`FrameWriter`] and [`ReplyReader`], so
//! exactly one task owns each direction and no lock is needed:
//!
//! ```text
//! Submission task ─► FrameWriter ─┐
//!                                 ├─► websocket ◄─► node
//! Collector task  ◄─ ReplyReader ─┘
//! ```

mod websocket;

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::WireFrame;

pub use websocket::{connect, endpoint_url, Connection, WsReader, WsWriter, CONNECTION_PATH};

/// Write half of the connection.
pub trait FrameWriter: Send + 'static {
    /// Write one frame. Returns once the frame has been handed to the
    /// transport and flushed.
    fn write_frame(&mut self, frame: &WireFrame) -> impl Future<Output = Result<()>> + Send;

    /// Gracefully close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Read half of the connection.
pub trait ReplyReader: Send + 'static {
    /// Read the next reply message.
    ///
    /// Returns [`BenchError::ConnectionClosed`](crate::BenchError::ConnectionClosed)
    /// once the peer closed the connection.
    fn read_reply(&mut self) -> impl Future<Output = Result<Bytes>> + Send;
}
