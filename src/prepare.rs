//! Message preparation.
//!
//! Every transaction is serialized, wrapped in a JSON-RPC request and
//! encoded once, before the connection is opened. The submission task then
//! only copies finished payloads onto the wire.

use crate::codec::Marshal;
use crate::error::{BenchError, BoxError, Result};
use crate::protocol::{SubmitMode, WireFrame};

/// Turns a transaction source into wire frames for one submission mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preparer {
    mode: SubmitMode,
}

impl Preparer {
    /// Create a preparer for `mode`.
    pub fn new(mode: SubmitMode) -> Self {
        Self { mode }
    }

    /// Submission mode the frames are built for.
    pub fn mode(&self) -> SubmitMode {
        self.mode
    }

    /// Prepare every transaction produced by `source`.
    ///
    /// Frames get sequence numbers (and request ids) `0..n` in input order.
    /// Exhaustion of `source` is the end of input.
    ///
    /// # Errors
    ///
    /// Stops at the first transaction that cannot be read or serialized;
    /// nothing prepared so far is returned.
    pub fn prepare<I, T, E>(&self, source: I) -> Result<Vec<WireFrame>>
    where
        I: IntoIterator<Item = std::result::Result<T, E>>,
        T: Marshal,
        E: Into<BoxError>,
    {
        let source = source.into_iter();
        let mut frames = Vec::with_capacity(source.size_hint().0);

        for (index, item) in source.enumerate() {
            let tx = item.map_err(|e| BenchError::Input {
                index,
                source: e.into(),
            })?;
            let raw = tx.marshal().map_err(|e| BenchError::Marshal {
                index,
                source: Box::new(e),
            })?;
            frames.push(WireFrame::transaction(index, self.mode, &raw)?);
        }

        tracing::debug!("Prepared {} frames for {} mode", frames.len(), self.mode);
        Ok(frames)
    }
}

/// Prepare `count` frames that all carry the same transaction.
///
/// Each frame still gets its own id, so replies stay correlated.
pub fn prepare_repeated<T: Marshal>(
    tx: &T,
    count: usize,
    mode: SubmitMode,
) -> Result<Vec<WireFrame>> {
    let raw = tx.marshal().map_err(|e| BenchError::Marshal {
        index: 0,
        source: Box::new(e),
    })?;

    (0..count)
        .map(|seq| WireFrame::transaction(seq, mode, &raw))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{write_tx, RawTx, TxReader};
    use serde_json::Value;
    use std::convert::Infallible;
    use std::io;

    /// Serializer that refuses one specific payload.
    struct Picky(&'static str);

    #[derive(Debug, thiserror::Error)]
    #[error("refusing {0:?}")]
    struct Refused(&'static str);

    impl Marshal for Picky {
        type Error = Refused;

        fn marshal(&self) -> std::result::Result<Vec<u8>, Refused> {
            if self.0 == "bad" {
                return Err(Refused(self.0));
            }
            Ok(self.0.as_bytes().to_vec())
        }
    }

    fn ok(items: &[&'static [u8]]) -> Vec<std::result::Result<RawTx, Infallible>> {
        items.iter().map(|b| Ok(RawTx::from_slice(b))).collect()
    }

    #[test]
    fn test_ids_follow_input_order() {
        let frames = Preparer::new(SubmitMode::Sync)
            .prepare(ok(&[b"a", b"b", b"c"]))
            .unwrap();

        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.seq(), i);
            assert_eq!(frame.request_id(), i as i64);

            let request: Value = serde_json::from_str(frame.as_str()).unwrap();
            assert_eq!(request["method"], "broadcast_tx_sync");
        }
    }

    #[test]
    fn test_deterministic() {
        let input = ok(&[b"one", b"two", b"\x00\xff"]);
        let first = Preparer::new(SubmitMode::Commit)
            .prepare(input.clone())
            .unwrap();
        let second = Preparer::new(SubmitMode::Commit).prepare(input).unwrap();

        let first: Vec<_> = first.iter().map(WireFrame::payload).collect();
        let second: Vec<_> = second.iter().map(WireFrame::payload).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let frames = Preparer::default().prepare(ok(&[])).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn test_input_error_fails_fast() {
        let source = vec![
            Ok(RawTx::from_slice(b"a")),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")),
            Ok(RawTx::from_slice(b"c")),
        ];

        let err = Preparer::default().prepare(source).unwrap_err();
        assert!(matches!(err, BenchError::Input { index: 1, .. }));
        assert_eq!(
            err.to_string(),
            "cannot read transaction #1 from input: truncated"
        );
    }

    #[test]
    fn test_marshal_error_fails_fast() {
        let source: Vec<std::result::Result<Picky, Infallible>> =
            vec![Ok(Picky("good")), Ok(Picky("good")), Ok(Picky("bad"))];

        let err = Preparer::default().prepare(source).unwrap_err();
        assert!(matches!(err, BenchError::Marshal { index: 2, .. }));
    }

    #[test]
    fn test_prepare_from_reader() {
        let mut input = Vec::new();
        write_tx(&mut input, b"first").unwrap();
        write_tx(&mut input, b"second").unwrap();

        let frames = Preparer::default()
            .prepare(TxReader::new(&input[..]))
            .unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_prepare_repeated() {
        let frames = prepare_repeated(&RawTx::from_slice(b"same"), 4, SubmitMode::Commit).unwrap();

        let ids: Vec<i64> = frames.iter().map(WireFrame::request_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        let params: Vec<Value> = frames
            .iter()
            .map(|f| serde_json::from_str::<Value>(f.as_str()).unwrap()["params"].clone())
            .collect();
        assert!(params.windows(2).all(|w| w[0] == w[1]));
    }
}
