//! User-facing facade for building stateful services hosted by the entity
//! runtime. Import [`prelude`] to get the traits and types needed to
//! implement a component, plus [`serve`] to run it.

pub use statefun_core::{
    ComponentDescription, ComponentKind, ComponentRegistry, ContextFailure, Effect,
    EffectPayload, EffectSerializer, EntityConfig, Metadata, MetadataValue, Reply, ReplyOutcome,
    RuntimeConfig, RuntimeError, ServiceCommandRef, WriteConsistency,
};
pub use statefun_core::discovery::{
    DiscoveryHandler, ErrorReport, ProxyInfo, ServiceInfo, SourceLocation,
};
pub use statefun_crdt::{
    Counter, CounterMap, CrdtKind, CrdtValue, DeltaCRDT, Lattice, Map, MultiMap, Register,
    RegisterMap, Set, Vote,
};
pub use statefun_entities::{
    ActionBehavior, ActionContext, CommandContext, EventSourcedBehavior, EventSourcedInstance,
    InstanceRegistry, ReplicatedEntityBehavior, ReplicatedEntityInstance, ValueEntityBehavior,
    ValueEntityInstance,
};
pub use statefun_host::{
    serve, serve_with_shutdown, ActionService, DiscoveryService, EventSourcedService,
    ReplicatedEntityService, ShutdownHandle, ValueEntityService,
};

/// Initializes a `tracing` subscriber reading its filter from `RUST_LOG`,
/// falling back to `info` when unset. Call once at process startup.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Convenience re-exports for implementing a component.
pub mod prelude {
    pub use statefun_any::AnyValue;
    pub use statefun_core::{ComponentDescription, Metadata, Reply, RuntimeError};
    pub use statefun_crdt::{Counter, DeltaCRDT, Lattice, Map, Register, Set, Vote};
    pub use statefun_entities::{
        ActionBehavior, ActionContext, CommandContext, EventSourcedBehavior,
        ReplicatedEntityBehavior, ValueEntityBehavior,
    };
}
