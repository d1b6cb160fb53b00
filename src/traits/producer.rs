//! Pull traits for the immediate and suspending canonical producer forms.

use crate::errors::SeqResult;
use alloc::boxed::Box;
use async_trait::async_trait;

/// An immediate, single-pass, pull-based source of elements.
///
/// `Ok(Some(value))` yields the next element, `Ok(None)` signals exhaustion,
/// and `Err` carries a source failure that aborts the current drive. A
/// producer must not be pulled again once it has reported exhaustion or
/// failed; restartability lives one level up, in the producer factory held by
/// a [Pipeline].
///
/// [Pipeline]: crate::pipeline::Pipeline
pub trait Producer {
    /// The element type yielded by this producer.
    type Item;

    /// Requests the next element.
    fn pull(&mut self) -> SeqResult<Option<Self::Item>>;
}

impl<P: Producer + ?Sized> Producer for Box<P> {
    type Item = P::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        (**self).pull()
    }
}

/// A suspending, single-pass, pull-based source of elements.
///
/// The contract is identical to [Producer], except that a pull may suspend
/// until the element (or the exhaustion signal) becomes available. Suspension
/// only ever happens at this boundary: every downstream stage and folder step
/// is a synchronous transform applied once the pulled value has resolved.
#[async_trait]
pub trait SuspendingProducer: Send {
    /// The element type yielded by this producer.
    type Item: Send;

    /// Requests the next element, suspending until it resolves.
    async fn pull(&mut self) -> SeqResult<Option<Self::Item>>;
}

#[async_trait]
impl<P: SuspendingProducer + ?Sized> SuspendingProducer for Box<P> {
    type Item = P::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        (**self).pull().await
    }
}

/// An owned, type-erased immediate producer.
pub type BoxProducer<T> = Box<dyn Producer<Item = T> + Send>;

/// An owned, type-erased suspending producer.
pub type BoxSuspendingProducer<T> = Box<dyn SuspendingProducer<Item = T>>;
