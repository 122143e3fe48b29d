//! Replicated entities: state is a CRDT. Commands mutate it locally;
//! convergence with other replicas happens by exchanging deltas, not by
//! agreeing on command order.

use crate::context::CommandContext;
use serde::de::DeserializeOwned;
use serde::Serialize;
use statefun_any::AnyValue;
use statefun_core::{Metadata, Reply, RuntimeError};
use statefun_crdt::DeltaCRDT;

/// User-supplied behavior for a replicated entity. The CRDT itself holds all
/// durable state; `handle_command` only needs read/write access to it. The
/// CRDT's delta type must round-trip through serde so the host can carry it
/// on the wire as opaque bytes (see [`ReplicatedEntityInstance::flush_delta`]).
pub trait ReplicatedEntityBehavior: Send + Sync + 'static
where
    <Self::Crdt as DeltaCRDT>::Delta: Serialize + DeserializeOwned,
{
    type Crdt: DeltaCRDT + Clone + Send + Sync + 'static;

    fn initial_crdt(&self, entity_id: &str, replica_id: &str) -> Self::Crdt;

    fn handle_command(
        &self,
        crdt: &mut Self::Crdt,
        ctx: &mut CommandContext,
        command_name: &str,
        payload: AnyValue,
    ) -> Result<Reply, RuntimeError>;
}

pub struct ReplicatedEntityInstance<B: ReplicatedEntityBehavior>
where
    <B::Crdt as DeltaCRDT>::Delta: Serialize + DeserializeOwned,
{
    entity_id: String,
    crdt: B::Crdt,
    flushed_once: bool,
}

impl<B: ReplicatedEntityBehavior> ReplicatedEntityInstance<B>
where
    <B::Crdt as DeltaCRDT>::Delta: Serialize + DeserializeOwned,
{
    pub fn new(entity_id: impl Into<String>, replica_id: &str, behavior: &B) -> Self {
        let entity_id = entity_id.into();
        let crdt = behavior.initial_crdt(&entity_id, replica_id);
        Self { entity_id, crdt, flushed_once: false }
    }

    pub fn crdt(&self) -> &B::Crdt {
        &self.crdt
    }

    pub fn handle_command(
        &mut self,
        behavior: &B,
        command_name: &str,
        payload: AnyValue,
        metadata: Metadata,
    ) -> Result<Reply, RuntimeError> {
        let mut ctx = CommandContext::new(self.entity_id.clone(), command_name, metadata);
        let reply = behavior.handle_command(&mut self.crdt, &mut ctx, command_name, payload)?;
        Ok(reply.add_effects(ctx.into_effects()))
    }

    /// Drains the accumulated local delta for replication to the proxy. The
    /// first flush of a freshly-created instance sends the full state
    /// (an instance just created on this replica has nothing incremental to
    /// send yet); every flush after that sends only what changed.
    pub fn flush_delta(&mut self) -> Option<<B::Crdt as DeltaCRDT>::Delta> {
        let initial = !self.flushed_once;
        self.flushed_once = true;
        self.crdt.get_and_reset_delta(initial)
    }

    /// Merges a delta received from another replica.
    pub fn apply_delta(&mut self, delta: &<B::Crdt as DeltaCRDT>::Delta) {
        self.crdt.apply_delta(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statefun_crdt::Counter;

    struct Likes;

    impl ReplicatedEntityBehavior for Likes {
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
                other => Err(RuntimeError::UnknownCommandType(other.to_string())),
            }
        }
    }

    #[test]
    fn delta_replicates_between_two_instances() {
        let behavior = Likes;
        let mut a = ReplicatedEntityInstance::new("post-1", "replica-a", &behavior);
        let mut b = ReplicatedEntityInstance::new("post-1", "replica-b", &behavior);

        a.handle_command(&behavior, "Like", AnyValue::encode_bool(true), Metadata::new())
            .unwrap();
        let delta = a.flush_delta().unwrap();
        b.apply_delta(&delta);

        assert_eq!(b.crdt().value(), 1);
    }

    #[test]
    fn only_the_first_flush_sends_full_state() {
        let behavior = Likes;
        let mut a = ReplicatedEntityInstance::new("post-1", "replica-a", &behavior);
        a.handle_command(&behavior, "Like", AnyValue::encode_bool(true), Metadata::new())
            .unwrap();
        assert!(a.flush_delta().is_some());
        // No further commands; nothing pending to send.
        assert!(a.flush_delta().is_none());
    }
}
