//! Bidirectional stream handler for event-sourced entities. Differs from
//! the value-entity loop only in that each reply also carries the events
//! the command produced, which the proxy is responsible for persisting.

use async_stream::stream;
use futures::{Stream, StreamExt};
use statefun_core::Metadata;
use statefun_entities::{EventSourcedBehavior, EventSourcedInstance, InstanceRegistry};
use statefun_wire::convert::{any_from_wire, any_to_wire, metadata_from_wire, reply_to_wire};
use statefun_wire::proto::{entity_stream_in, entity_stream_out, EntityStreamIn, EntityStreamOut};
use std::pin::Pin;
use std::sync::Arc;
use tonic::{Request, Response, Status, Streaming};

pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<EntityStreamOut, Status>> + Send>>;

pub async fn handle<B: EventSourcedBehavior>(
    behavior: Arc<B>,
    registry: Arc<InstanceRegistry<EventSourcedInstance<B>>>,
    snapshot_every: Option<u32>,
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

        tracing::info!(entity_id = %entity_id, "event-sourced entity stream opened");
        let instance = registry.get_or_create(&entity_id, || {
            match snapshot {
                Some(wire_snapshot) => {
                    match behavior.decode_snapshot(&any_from_wire(&wire_snapshot)) {
                        Ok(state) => EventSourcedInstance::restore_from_snapshot(
                            entity_id.clone(),
                            behavior.as_ref(),
                            state,
                            std::iter::empty(),
                            snapshot_every,
                        ),
                        Err(e) => {
                            tracing::warn!(entity_id = %entity_id, error = %e, "malformed snapshot, rebuilding from initial state");
                            EventSourcedInstance::new(entity_id.clone(), behavior.as_ref(), snapshot_every)
                        }
                    }
                }
                None => EventSourcedInstance::new(entity_id.clone(), behavior.as_ref(), snapshot_every),
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
                Ok((reply, events, snapshot_due)) => {
                    let mut wire_reply = reply_to_wire(&reply);
                    wire_reply.persisted_events = events
                        .iter()
                        .map(|e| any_to_wire(&behavior.encode_event(e)))
                        .collect();
                    if snapshot_due {
                        tracing::debug!(entity_id = %entity_id, "snapshot threshold reached");
                    }
                    yield Ok(EntityStreamOut {
                        message: Some(entity_stream_out::Message::Reply(wire_reply)),
                    });
                }
                Err(e) => {
                    yield Err(Status::internal(e.to_string()));
                    break;
                }
            }
        }
        tracing::info!(entity_id = %entity_id, "event-sourced entity stream closed");
    };

    Ok(Response::new(Box::pin(stream)))
}

pub struct EventSourcedService<B: EventSourcedBehavior> {
    behavior: Arc<B>,
    registry: Arc<InstanceRegistry<EventSourcedInstance<B>>>,
    snapshot_every: Option<u32>,
}

impl<B: EventSourcedBehavior> EventSourcedService<B> {
    pub fn new(behavior: Arc<B>, snapshot_every: Option<u32>) -> Self {
        Self {
            behavior,
            registry: Arc::new(InstanceRegistry::new()),
            snapshot_every,
        }
    }
}

#[tonic::async_trait]
impl<B: EventSourcedBehavior> statefun_wire::proto::event_sourced_entities_server::EventSourcedEntities
    for EventSourcedService<B>
{
    type HandleStream = ResponseStream;

    async fn handle(
        &self,
        request: Request<Streaming<EntityStreamIn>>,
    ) -> Result<Response<Self::HandleStream>, Status> {
        handle(
            self.behavior.clone(),
            self.registry.clone(),
            self.snapshot_every,
            request,
        )
        .await
    }
}
