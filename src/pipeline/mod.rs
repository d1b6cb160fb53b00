//! This module contains the two pipeline façades over the stage chain.
//!
//! A pipeline is a value describing where elements come from and which stages
//! they pass through. Nothing is pulled until a terminal drive; every
//! combinator only wraps the producer factory. [Pipeline] drives with
//! synchronous pulls, [SuspendingPipeline] with suspending ones.

mod core;
pub use self::core::Pipeline;

mod suspend;
pub use suspend::SuspendingPipeline;
