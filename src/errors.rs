//! This module contains the error taxonomy shared by source adaptation,
//! pipeline construction, and drives.

use alloc::string::String;

/// A result type where the error is a [SeqError].
pub type SeqResult<T> = Result<T, SeqError>;

/// An error raised while adapting a source, constructing a pipeline, or
/// driving one.
///
/// Construction-time validation failures surface from the constructor that
/// detected them and never wait for drive time. Drive-time failures abort the
/// one drive that observed them; the pipeline and folder values themselves
/// remain usable for another drive.
#[derive(derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum SeqError {
    /// The supplied source has no synchronous pull protocol.
    #[display("source does not support synchronous pulls")]
    NotIterable,
    /// The supplied source has no suspending pull protocol.
    #[display("source does not support suspending pulls")]
    NotSuspendable,
    /// An already-canonical producer was handed back to the adapter.
    #[display("producer is already canonical; refusing to wrap it twice")]
    RedundantWrap,
    /// A combinator that re-drives its source from the start was given a
    /// single-pass producer.
    #[display("producer is single-pass and cannot be restarted")]
    NotRestartable,
    /// A terminal operation that needs at least one element was driven over
    /// an empty sequence.
    #[display("sequence yielded no elements")]
    EmptySequenceUnsupported,
    /// A producer failed while pulling.
    #[display("source failure: {_0}")]
    Source(String),
}

impl core::error::Error for SeqError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SeqError::NotRestartable.to_string(),
            "producer is single-pass and cannot be restarted"
        );
        assert_eq!(SeqError::Source("boom".to_string()).to_string(), "source failure: boom");
    }
}
