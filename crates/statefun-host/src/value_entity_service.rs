//! Bidirectional stream handler for value entities. The first message on
//! the stream names the entity id; every message after that is a command.
//! Grounded in the request/response-per-item shape of a proxied bidi
//! stream: read one inbound message, do the work, yield one outbound
//! message, repeat until the stream closes.

use async_stream::stream;
use futures::{Stream, StreamExt};
use statefun_core::Metadata;
use statefun_entities::{InstanceRegistry, ValueEntityBehavior, ValueEntityInstance};
use statefun_wire::convert::{any_from_wire, metadata_from_wire, reply_to_wire};
use statefun_wire::proto::{entity_stream_in, entity_stream_out, EntityStreamIn, EntityStreamOut};
use std::pin::Pin;
use std::sync::Arc;
use tonic::{Request, Response, Status, Streaming};

pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<EntityStreamOut, Status>> + Send>>;

pub async fn handle<B: ValueEntityBehavior>(
    behavior: Arc<B>,
    registry: Arc<InstanceRegistry<ValueEntityInstance<B>>>,
    request: Request<Streaming<EntityStreamIn>>,
) -> Result<Response<ResponseStream>, Status> {
    let mut inbound = request.into_inner();

    let stream = stream! {
        let (entity_id, snapshot) = match inbound.next().await {
            Some(Ok(EntityStreamIn { message: Some(entity_stream_in::Message::Init(init)) })) => {
                (init.entity_id, init.snapshot)
            }
            Some(Ok(_)) => {
                yield Err(Status::invalid_argument("first message on an entity stream must be Init"));
                return;
            }
            Some(Err(e)) => {
                yield Err(e);
                return;
            }
            None => return,
        };

        tracing::info!(entity_id = %entity_id, "value entity stream opened");
        let instance = registry.get_or_create(&entity_id, || {
            match snapshot {
                Some(wire_snapshot) => {
                    match behavior.decode_state(&any_from_wire(&wire_snapshot)) {
                        Ok(state) => ValueEntityInstance::restore(entity_id.clone(), state),
                        Err(e) => {
                            tracing::warn!(entity_id = %entity_id, error = %e, "malformed snapshot, rebuilding from initial state");
                            ValueEntityInstance::new(entity_id.clone(), behavior.as_ref())
                        }
                    }
                }
                None => ValueEntityInstance::new(entity_id.clone(), behavior.as_ref()),
            }
        });

        loop {
            let message = match inbound.next().await {
                Some(Ok(m)) => m,
                Some(Err(e)) => {
                    yield Err(e);
                    break;
                }
                None => break,
            };
            let command = match message.message {
                Some(entity_stream_in::Message::Command(c)) => c,
                Some(entity_stream_in::Message::Init(_)) => {
                    yield Err(Status::invalid_argument("Init may only be the first message"));
                    break;
                }
                None => continue,
            };

            let payload = command
                .payload
                .as_ref()
                .map(any_from_wire)
                .unwrap_or_else(|| statefun_any::AnyValue::new("", Vec::new()));
            let metadata = command
                .metadata
                .as_ref()
                .map(metadata_from_wire)
                .unwrap_or_else(Metadata::new);

            let mut guard = instance.lock().await;
            match guard.handle_command(behavior.as_ref(), &command.name, payload, metadata) {
                Ok(reply) => {
                    yield Ok(EntityStreamOut {
                        message: Some(entity_stream_out::Message::Reply(reply_to_wire(&reply))),
                    });
                }
                Err(e) => {
                    yield Err(Status::internal(e.to_string()));
                    break;
                }
            }
        }
        tracing::info!(entity_id = %entity_id, "value entity stream closed");
    };

    Ok(Response::new(Box::pin(stream)))
}

/// The generated `ValueEntities` service, backed by one behavior and its
/// instance registry.
pub struct ValueEntityService<B: ValueEntityBehavior> {
    behavior: Arc<B>,
    registry: Arc<InstanceRegistry<ValueEntityInstance<B>>>,
}

impl<B: ValueEntityBehavior> ValueEntityService<B> {
    pub fn new(behavior: Arc<B>) -> Self {
        Self {
            behavior,
            registry: Arc::new(InstanceRegistry::new()),
        }
    }
}

#[tonic::async_trait]
impl<B: ValueEntityBehavior> statefun_wire::proto::value_entities_server::ValueEntities
    for ValueEntityService<B>
{
    type HandleStream = ResponseStream;

    async fn handle(
        &self,
        request: Request<Streaming<EntityStreamIn>>,
    ) -> Result<Response<Self::HandleStream>, Status> {
        handle(self.behavior.clone(), self.registry.clone(), request).await
    }
}
