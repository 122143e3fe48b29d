//! Bidirectional stream handler for replicated entities. Command handling
//! follows the same per-message shape as value entities, with two additions:
//! an inbound `Delta` frame merges another replica's change into this
//! instance's CRDT before the next command runs, and every reply carries
//! whatever this instance accumulated locally since its last flush, so the
//! proxy can forward it on to other replicas.

use async_stream::stream;
use futures::{Stream, StreamExt};
use statefun_core::Metadata;
use statefun_crdt::DeltaCRDT;
use statefun_entities::{InstanceRegistry, ReplicatedEntityBehavior, ReplicatedEntityInstance};
use statefun_wire::convert::{any_from_wire, crdt_delta_to_wire, metadata_from_wire, reply_to_wire};
use statefun_wire::proto::{entity_stream_in, entity_stream_out, CrdtDelta, EntityStreamIn, EntityStreamOut};
use std::pin::Pin;
use std::sync::Arc;
use tonic::{Request, Response, Status, Streaming};

pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<EntityStreamOut, Status>> + Send>>;

/// Decodes a wire delta into the CRDT's own delta type. A malformed payload
/// is a proxy/runtime version skew, not a recoverable command error, so it
/// fails the whole stream rather than one command.
fn decode_delta<D: serde::de::DeserializeOwned>(wire: &CrdtDelta) -> Result<D, Status> {
    serde_json::from_slice(&wire.payload)
        .map_err(|e| Status::internal(format!("malformed CRDT delta: {e}")))
}

fn encode_delta<D: serde::Serialize>(delta: &D) -> CrdtDelta {
    crdt_delta_to_wire(serde_json::to_vec(delta).expect("CRDT deltas always serialize"))
}

pub async fn handle<B>(
    behavior: Arc<B>,
    registry: Arc<InstanceRegistry<ReplicatedEntityInstance<B>>>,
    replica_id: Arc<str>,
    request: Request<Streaming<EntityStreamIn>>,
) -> Result<Response<ResponseStream>, Status>
where
    B: ReplicatedEntityBehavior,
    <B::Crdt as DeltaCRDT>::Delta: serde::Serialize + serde::de::DeserializeOwned,
{
    let mut inbound = request.into_inner();

    let stream = stream! {
        let (entity_id, initial_delta) = match inbound.next().await {
            Some(Ok(EntityStreamIn { message: Some(entity_stream_in::Message::Init(init)) })) => {
                (init.entity_id, init.initial_delta)
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

        tracing::info!(entity_id = %entity_id, "replicated entity stream opened");
        let instance = registry.get_or_create(&entity_id, || {
            ReplicatedEntityInstance::new(entity_id.clone(), &replica_id, behavior.as_ref())
        });

        if let Some(wire_delta) = initial_delta {
            let delta = match decode_delta::<<B::Crdt as DeltaCRDT>::Delta>(&wire_delta) {
                Ok(d) => d,
                Err(status) => {
                    yield Err(status);
                    return;
                }
            };
            instance.lock().await.apply_delta(&delta);
        }

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
                Some(entity_stream_in::Message::Delta(wire_delta)) => {
                    let delta = match decode_delta::<<B::Crdt as DeltaCRDT>::Delta>(&wire_delta) {
                        Ok(d) => d,
                        Err(status) => {
                            yield Err(status);
                            break;
                        }
                    };
                    instance.lock().await.apply_delta(&delta);
                    continue;
                }
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
                    let mut wire_reply = reply_to_wire(&reply);
                    wire_reply.outbound_delta = guard.flush_delta().map(|d| encode_delta(&d));
                    drop(guard);
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
        tracing::info!(entity_id = %entity_id, "replicated entity stream closed");
    };

    Ok(Response::new(Box::pin(stream)))
}

pub struct ReplicatedEntityService<B>
where
    B: ReplicatedEntityBehavior,
    <B::Crdt as DeltaCRDT>::Delta: serde::Serialize + serde::de::DeserializeOwned,
{
    behavior: Arc<B>,
    registry: Arc<InstanceRegistry<ReplicatedEntityInstance<B>>>,
    replica_id: Arc<str>,
}

impl<B> ReplicatedEntityService<B>
where
    B: ReplicatedEntityBehavior,
    <B::Crdt as DeltaCRDT>::Delta: serde::Serialize + serde::de::DeserializeOwned,
{
    pub fn new(behavior: Arc<B>, replica_id: impl Into<Arc<str>>) -> Self {
        Self {
            behavior,
            registry: Arc::new(InstanceRegistry::new()),
            replica_id: replica_id.into(),
        }
    }
}

#[tonic::async_trait]
impl<B> statefun_wire::proto::replicated_entities_server::ReplicatedEntities for ReplicatedEntityService<B>
where
    B: ReplicatedEntityBehavior,
    <B::Crdt as DeltaCRDT>::Delta: serde::Serialize + serde::de::DeserializeOwned,
{
    type HandleStream = ResponseStream;

    async fn handle(
        &self,
        request: Request<Streaming<EntityStreamIn>>,
    ) -> Result<Response<Self::HandleStream>, Status> {
        handle(
            self.behavior.clone(),
            self.registry.clone(),
            self.replica_id.clone(),
            request,
        )
        .await
    }
}
