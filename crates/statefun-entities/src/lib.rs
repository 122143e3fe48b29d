//! Entity state machines hosted by the runtime.
//!
//! - [`value_entity`] - whole-state read/replace entities
//! - [`event_sourced`] - state rebuilt by replaying emitted events
//! - [`replicated_entity`] - CRDT-backed state, converged by delta exchange
//! - [`action`] - stateless request handlers
//! - [`context`] - the per-call context handed to every handler
//! - [`registry`] - per-entity-id instance registry with single-writer semantics

pub mod action;
pub mod context;
pub mod event_sourced;
pub mod registry;
pub mod replicated_entity;
pub mod value_entity;

pub use action::{invoke, ActionBehavior, ActionContext};
pub use context::CommandContext;
pub use event_sourced::{should_snapshot, EventSourcedBehavior, EventSourcedInstance};
pub use registry::InstanceRegistry;
pub use replicated_entity::{ReplicatedEntityBehavior, ReplicatedEntityInstance};
pub use value_entity::{ValueEntityBehavior, ValueEntityInstance};

/// Convenience re-exports for implementing handlers.
pub mod prelude {
    pub use crate::action::{ActionBehavior, ActionContext};
    pub use crate::context::CommandContext;
    pub use crate::event_sourced::EventSourcedBehavior;
    pub use crate::replicated_entity::ReplicatedEntityBehavior;
    pub use crate::value_entity::ValueEntityBehavior;
    pub use statefun_any::AnyValue;
    pub use statefun_core::{Reply, RuntimeError};
}
