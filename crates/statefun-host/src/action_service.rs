//! Bidirectional stream handler for actions. Actions have no entity
//! identity, so an `Init` message (if sent at all) is ignored rather than
//! used to look up an instance. A single [`statefun_entities::ActionContext`]
//! lives for the whole stream, which is what lets one behavior implement any
//! of the four call shapes the proxy may drive it with: unary, streamed-in,
//! streamed-out, or bidirectional.

use async_stream::stream;
use futures::{Stream, StreamExt};
use statefun_core::Metadata;
use statefun_entities::{ActionBehavior, ActionContext};
use statefun_wire::convert::{any_from_wire, metadata_from_wire, reply_to_wire};
use statefun_wire::proto::{entity_stream_in, entity_stream_out, EntityStreamIn, EntityStreamOut};
use std::pin::Pin;
use std::sync::Arc;
use tonic::{Request, Response, Status, Streaming};

pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<EntityStreamOut, Status>> + Send>>;

pub async fn handle<B: ActionBehavior>(
    behavior: Arc<B>,
    request: Request<Streaming<EntityStreamIn>>,
) -> Result<Response<ResponseStream>, Status> {
    let mut inbound = request.into_inner();

    let stream = stream! {
        let mut ctx = ActionContext::new(Metadata::new());
        loop {
            let message = match inbound.next().await {
                Some(Ok(m)) => m,
                Some(Err(e)) => {
                    behavior.handle_cancel(&mut ctx);
                    yield Err(e);
                    break;
                }
                None => {
                    if let Err(e) = behavior.handle_end_of_input(&mut ctx) {
                        yield Err(Status::internal(e.to_string()));
                        break;
                    }
                    for reply in ctx.drain_replies() {
                        yield Ok(EntityStreamOut {
                            message: Some(entity_stream_out::Message::Reply(reply_to_wire(&reply))),
                        });
                    }
                    break;
                }
            };
            let command = match message.message {
                Some(entity_stream_in::Message::Command(c)) => c,
                Some(entity_stream_in::Message::Init(_)) => continue,
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
            ctx.set_metadata(metadata);

            match behavior.handle_command(&mut ctx, &command.name, payload) {
                Ok(()) => {
                    for reply in ctx.drain_replies() {
                        yield Ok(EntityStreamOut {
                            message: Some(entity_stream_out::Message::Reply(reply_to_wire(&reply))),
                        });
                    }
                }
                Err(e) => {
                    behavior.handle_cancel(&mut ctx);
                    yield Err(Status::internal(e.to_string()));
                    break;
                }
            }
        }
    };

    Ok(Response::new(Box::pin(stream)))
}

pub struct ActionService<B: ActionBehavior> {
    behavior: Arc<B>,
}

impl<B: ActionBehavior> ActionService<B> {
    pub fn new(behavior: Arc<B>) -> Self {
        Self { behavior }
    }
}

#[tonic::async_trait]
impl<B: ActionBehavior> statefun_wire::proto::actions_server::Actions for ActionService<B> {
    type HandleStream = ResponseStream;

    async fn handle(
        &self,
        request: Request<Streaming<EntityStreamIn>>,
    ) -> Result<Response<Self::HandleStream>, Status> {
        handle(self.behavior.clone(), request).await
    }
}
