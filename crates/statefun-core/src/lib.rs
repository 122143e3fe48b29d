//! Component registry, discovery handshake, effect serializer, reply
//! builder, and the error taxonomy shared by every entity kind the runtime
//! hosts.

pub mod component;
pub mod config;
pub mod context_failure;
pub mod discovery;
pub mod effect;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod reply;

pub use component::{ComponentDescription, ComponentKind, EntityConfig, WriteConsistency};
pub use config::RuntimeConfig;
pub use context_failure::ContextFailure;
pub use discovery::{
    DiscoveryHandler, DiscoveryResponse, ErrorReport, PreStart, PreStartInfo, ProxyInfo,
    ServiceInfo, SourceLocation,
};
pub use effect::{Effect, EffectPayload, EffectSerializer, ServiceCommandRef};
pub use error::{Result, RuntimeError};
pub use metadata::{Metadata, MetadataValue};
pub use registry::ComponentRegistry;
pub use reply::{Reply, ReplyOutcome};
