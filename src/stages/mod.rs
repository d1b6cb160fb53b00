//! This module contains the transformation stages chained by pipelines.
//!
//! Every stage is an explicit state machine (buffer, skip counter, done flag)
//! wrapping the previous producer in the chain. The state machine is shared
//! between the two drive modes; each stage carries one synchronous
//! [Producer] impl and one suspending [SuspendingProducer] impl over the same
//! state.
//!
//! [Producer]: crate::traits::Producer
//! [SuspendingProducer]: crate::traits::SuspendingProducer

use alloc::sync::Arc;

mod transform;
pub use transform::{FilterStage, FlatMapStage, InspectStage, MapStage};

mod bound;
pub use bound::{DropStage, DropWhileStage, TakeStage, TakeWhileStage};

mod sliding;
pub use sliding::SlidingStage;

mod split;
pub use split::SplitStage;

mod patch;
pub use patch::{PatchRule, PatchStage};

mod distinct;
pub use distinct::DistinctStage;

mod zip;
pub use zip::{ZipAllStage, ZipManyStage, ZipPairStage};

mod chain;
pub use chain::{ConcatStage, RepeatStage};

mod interleave;
pub use interleave::InterleaveRoundStage;

mod scan;
pub use scan::ScanStage;

/// A shared elementwise mapping function.
pub(crate) type ArcMapFn<T, U> = Arc<dyn Fn(T) -> U + Send + Sync>;

/// A shared element predicate.
pub(crate) type ArcPred<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
