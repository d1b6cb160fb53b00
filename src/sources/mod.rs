//! This module contains the producer adapter: the intake probe plus the
//! concrete adapters that normalize supported sources into one of the two
//! canonical producer forms.

mod adapt;
pub use adapt::{RawSource, Source};

mod iter;
pub use iter::{FnProducer, IterProducer};

mod stream;
pub use stream::{LiftProducer, StreamProducer};

mod factory;
pub(crate) use factory::{SourceFactory, SuspendingSourceFactory};
