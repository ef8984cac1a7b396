//! Length-prefixed transaction streams.
//!
//! Each transaction is preceded by its length:
//! ```text
//! ┌──────────┬────────────────────┐
//! │ Length   │ Transaction bytes  │
//! │ 4 bytes  │ Length bytes       │
//! │ uint32 BE│                    │
//! └──────────┴────────────────────┘
//! ```
//!
//! End of input is only valid on a record boundary. A stream that stops in
//! the middle of a prefix or a body is an error.

use std::io::{self, ErrorKind, Read, Write};

use super::RawTx;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum transaction size (16 MB).
pub const DEFAULT_MAX_TX_SIZE: u32 = 16 * 1024 * 1024;

/// Iterator over length-prefixed transactions read from `R`.
///
/// Yields `Ok(tx)` for every complete record, `None` at a clean end of input,
/// and `Err` for truncated or oversized records. After an error the iterator
/// is fused and only returns `None`.
pub struct TxReader<R> {
    input: R,
    max_tx_size: u32,
    done: bool,
}

impl<R: Read> TxReader<R> {
    /// Create a reader with the default size limit.
    pub fn new(input: R) -> Self {
        Self::with_max_size(input, DEFAULT_MAX_TX_SIZE)
    }

    /// Create a reader rejecting transactions larger than `max_tx_size`.
    pub fn with_max_size(input: R, max_tx_size: u32) -> Self {
        Self {
            input,
            max_tx_size,
            done: false,
        }
    }

    fn read_next(&mut self) -> io::Result<Option<RawTx>> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        let mut filled = 0;
        while filled < LENGTH_PREFIX_SIZE {
            match self.input.read(&mut prefix[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "truncated transaction length prefix",
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let len = u32::from_be_bytes(prefix);
        if len > self.max_tx_size {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!(
                    "transaction of {} bytes exceeds limit of {} bytes",
                    len, self.max_tx_size
                ),
            ));
        }

        let mut body = vec![0u8; len as usize];
        self.input.read_exact(&mut body)?;
        Ok(Some(RawTx::from(body)))
    }
}

impl<R: Read> Iterator for TxReader<R> {
    type Item = io::Result<RawTx>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(tx)) => Some(Ok(tx)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Write one length-prefixed transaction.
pub fn write_tx<W: Write>(out: &mut W, raw_tx: &[u8]) -> io::Result<()> {
    let len = u32::try_from(raw_tx.len())
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "transaction too large"))?;
    out.write_all(&len.to_be_bytes())?;
    out.write_all(raw_tx)
}
