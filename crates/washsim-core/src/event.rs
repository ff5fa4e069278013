//! Simulation events.

use std::cmp::Ordering;

use downcast_rs::{impl_downcast, Downcast};
use serde::ser::Serialize;

use crate::component::Id;

/// Event identifier.
pub type EventId = u64;

/// Trait for event payloads.
///
/// Any serializable type can be used as an event payload. Payloads are serialized only
/// for diagnostic logging.
pub trait EventData: Downcast + erased_serde::Serialize {}

impl_downcast!(EventData);

erased_serde::serialize_trait_object!(EventData);

impl<T: Serialize + 'static> EventData for T {}

/// Representation of event with untyped payload.
pub struct Event {
    /// Unique event identifier.
    ///
    /// Identifiers are assigned sequentially in the order of event creation,
    /// which also serves as the tie-breaker for events scheduled for the same time.
    pub id: EventId,
    /// Time of event occurrence.
    pub time: f64,
    /// Identifier of event source.
    pub src: Id,
    /// Identifier of event destination.
    pub dst: Id,
    /// Event payload.
    pub data: Box<dyn EventData>,
}

impl Event {
    pub(crate) fn downcast<T: EventData>(self) -> TypedEvent<T> {
        match self.data.downcast::<T>() {
            Ok(data) => TypedEvent {
                id: self.id,
                time: self.time,
                src: self.src,
                dst: self.dst,
                data: *data,
            },
            Err(_) => panic!(
                "Failed to downcast event payload to type {}",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl Eq for Event {}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.total_cmp(&self.time).then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Representation of event with typed payload.
///
/// Returned by awaitable event futures, where the payload type is known statically.
pub struct TypedEvent<T: EventData> {
    /// Unique event identifier.
    pub id: EventId,
    /// Time of event occurrence.
    pub time: f64,
    /// Identifier of event source.
    pub src: Id,
    /// Identifier of event destination.
    pub dst: Id,
    /// Event payload.
    pub data: T,
}
