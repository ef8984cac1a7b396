//! Codec module - transaction serialization and input framing.
//!
//! The binary transaction format belongs to the chain, not to this crate, so
//! it is reached through the [`Marshal`] trait:
//!
//! - [`RawTx`] - a transaction that is already encoded (pass-through)
//! - [`TxReader`] - reads consecutive length-prefixed transactions from a byte stream
//! - [`write_tx`] - writes one transaction in the format [`TxReader`] expects
//!
//! # Example
//!
//! ```
//! use txbench::codec::{write_tx, Marshal, RawTx, TxReader};
//!
//! let mut input = Vec::new();
//! write_tx(&mut input, b"first").unwrap();
//! write_tx(&mut input, b"second").unwrap();
//!
//! let txs: Vec<RawTx> = TxReader::new(&input[..]).collect::<Result<_, _>>().unwrap();
//! assert_eq!(txs.len(), 2);
//! assert_eq!(txs[1].marshal().unwrap(), b"second");
//! ```

mod framed;
mod raw;

pub use framed::{write_tx, TxReader, DEFAULT_MAX_TX_SIZE, LENGTH_PREFIX_SIZE};
pub use raw::RawTx;

/// A transaction that can be serialized to the chain's binary format.
pub trait Marshal {
    /// Error returned when serialization fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Serialize the transaction.
    fn marshal(&self) -> Result<Vec<u8>, Self::Error>;
}

impl<T: Marshal + ?Sized> Marshal for &T {
    type Error = T::Error;

    fn marshal(&self) -> Result<Vec<u8>, Self::Error> {
        (**self).marshal()
    }
}
