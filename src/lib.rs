#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(any(test, feature = "test-utils")), no_std)]

extern crate alloc;

/// Re-export commonly used types and traits.
pub mod prelude {
    pub use crate::{
        combine,
        errors::{SeqError, SeqResult},
        fold::{catalog, combine, combine_with, Folder},
        pipeline::{Pipeline, SuspendingPipeline},
        sources::{RawSource, Source},
        stages::PatchRule,
        traits::{BoxProducer, BoxSuspendingProducer, Producer, SuspendingProducer},
    };
}

pub use errors::{SeqError, SeqResult};

pub mod errors;
pub mod fold;
pub mod pipeline;
pub mod sources;
pub mod stages;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod macros;
