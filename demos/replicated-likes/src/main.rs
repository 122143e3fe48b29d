//! Demo: a replicated like-counter entity. Unlike the value-entity counter
//! in `src/main.rs`, state here is a CRDT — concurrent `Like` commands on
//! different replicas never conflict; they converge by merging deltas.

use statefun_sdk::prelude::*;
use statefun_sdk::{
    serve, ComponentDescription, ComponentRegistry, Counter, DiscoveryHandler, RuntimeConfig,
    ServiceInfo,
};
use std::sync::Arc;

struct LikeCounter;

impl ReplicatedEntityBehavior for LikeCounter {
    type Crdt = Counter;

    fn initial_crdt(&self, _entity_id: &str, _replica_id: &str) -> Counter {
        Counter::new()
    }

    fn handle_command(
        &self,
        crdt: &mut Counter,
        _ctx: &mut CommandContext,
        command_name: &str,
        _payload: AnyValue,
    ) -> Result<Reply, RuntimeError> {
        match command_name {
            "Like" => {
                crdt.increment(1);
                Ok(Reply::message(AnyValue::encode_i64(crdt.value())))
            }
            "Unlike" => {
                crdt.increment(-1);
                Ok(Reply::message(AnyValue::encode_i64(crdt.value())))
            }
            "GetLikes" => Ok(Reply::message(AnyValue::encode_i64(crdt.value()))),
            other => Err(RuntimeError::UnknownCommandType(other.to_string())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    statefun_sdk::init_tracing();

    let config = RuntimeConfig::new("replicated-likes-demo")
        .with_service_version(env!("CARGO_PKG_VERSION"))
        .merge_env();

    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescription::replicated_entity(
        "com.example.LikeService",
        "likes",
    ));
    let components = registry.finish();

    let discovery = DiscoveryHandler::new(
        ServiceInfo {
            service_name: config.service_name.clone(),
            service_version: config.service_version.clone(),
        },
        statefun_wire::proto::FILE_DESCRIPTOR_SET.to_vec(),
        components,
    );

    let behavior = Arc::new(LikeCounter);
    let replica_id = std::env::var("REPLICA_ID").unwrap_or_else(|_| "replica-1".to_string());

    serve(config.bind_address, discovery, move |router| {
        router.add_service(
            statefun_wire::proto::replicated_entities_server::ReplicatedEntitiesServer::new(
                statefun_sdk::ReplicatedEntityService::new(behavior, replica_id),
            ),
        )
    })
    .await?;

    Ok(())
}
