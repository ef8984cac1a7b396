//! Raw transactions - already encoded bytes.
//!
//! Used when transactions were signed and serialized by another tool and
//! arrive here as opaque bytes.

use std::convert::Infallible;

use bytes::Bytes;

use super::Marshal;

/// A transaction that is already in its binary wire format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTx(Bytes);

impl RawTx {
    /// Wrap encoded transaction bytes (zero-copy).
    #[inline]
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    /// Copy a slice into a new raw transaction.
    #[inline]
    pub fn from_slice(data: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(data))
    }

    /// Encoded bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the encoded bytes.
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Vec<u8>> for RawTx {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<Bytes> for RawTx {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

impl Marshal for RawTx {
    type Error = Infallible;

    #[inline]
    fn marshal(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.0.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marshal_is_identity() {
        let tx = RawTx::from_slice(b"signed tx");
        assert_eq!(tx.marshal().unwrap(), b"signed tx");
    }

    #[test]
    fn test_binary_data_preserved() {
        let all_bytes: Vec<u8> = (0..=255).collect();
        let tx = RawTx::from(all_bytes.clone());
        assert_eq!(tx.as_bytes(), &all_bytes[..]);
        assert_eq!(tx.marshal().unwrap(), all_bytes);
    }

    #[test]
    fn test_new_is_zero_copy() {
        let bytes = Bytes::from_static(b"static data");
        let tx = RawTx::new(bytes.clone());
        assert_eq!(tx.as_bytes().as_ptr(), bytes.as_ptr());
        assert_eq!(tx.into_bytes(), bytes);
    }

    #[test]
    fn test_marshal_through_reference() {
        let tx = RawTx::from_slice(b"abc");
        let by_ref = &tx;
        assert_eq!(Marshal::marshal(&by_ref).unwrap(), b"abc");
    }
}
