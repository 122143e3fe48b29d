//! Demo: a value-entity counter served over gRPC.
//!
//! Run it, then discover it with any Kalix-protocol-speaking proxy, or drive
//! it directly with `grpcurl` against `statefun.v1.ValueEntities/Handle`.

use statefun_sdk::prelude::*;
use statefun_sdk::{
    serve, ComponentDescription, ComponentRegistry, DiscoveryHandler, RuntimeConfig, ServiceInfo,
    ValueEntityService,
};
use std::sync::Arc;

struct CounterEntity;

impl ValueEntityBehavior for CounterEntity {
    type State = i64;

    fn initial_state(&self, _entity_id: &str) -> i64 {
        0
    }

    fn handle_command(
        &self,
        state: i64,
        _ctx: &mut CommandContext,
        command_name: &str,
        payload: AnyValue,
    ) -> Result<(i64, Reply), RuntimeError> {
        match command_name {
            "Increment" => {
                let by = payload.decode_i64().unwrap_or(1);
                let next = state + by;
                Ok((next, Reply::message(AnyValue::encode_i64(next))))
            }
            "GetValue" => Ok((state, Reply::message(AnyValue::encode_i64(state)))),
            other => Err(RuntimeError::UnknownCommandType(other.to_string())),
        }
    }

    fn encode_state(&self, state: &i64) -> AnyValue {
        AnyValue::encode_i64(*state)
    }

    fn decode_state(&self, value: &AnyValue) -> Result<i64, RuntimeError> {
        Ok(value.decode_i64()?)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    statefun_sdk::init_tracing();

    let config = RuntimeConfig::new("counter-demo")
        .with_service_version(env!("CARGO_PKG_VERSION"))
        .merge_env();

    let mut registry = ComponentRegistry::new();
    registry.register(ComponentDescription::value_entity(
        "com.example.CounterService",
        "counter",
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

    let behavior = Arc::new(CounterEntity);

    serve(config.bind_address, discovery, move |router| {
        router.add_service(
            statefun_wire::proto::value_entities_server::ValueEntitiesServer::new(
                ValueEntityService::new(behavior),
            ),
        )
    })
    .await?;

    Ok(())
}
