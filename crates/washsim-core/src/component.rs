//! Simulation components.

/// Identifier of simulation component.
///
/// Identifiers are assigned sequentially starting from 0 in the order of component registration
/// (see [`Simulation::create_context`](crate::Simulation::create_context)).
pub type Id = u32;
