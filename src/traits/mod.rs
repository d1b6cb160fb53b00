//! This module contains the traits describing the two canonical producer
//! forms pulled by pipelines and folder drives.

mod producer;
pub use producer::{BoxProducer, BoxSuspendingProducer, Producer, SuspendingProducer};
