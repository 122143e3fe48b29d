//! Value entities: commands read the whole state and return a replacement,
//! which the instance commits only if the reply is not a failure.

use crate::context::CommandContext;
use statefun_any::AnyValue;
use statefun_core::{Reply, RuntimeError};

/// User-supplied behavior for a value entity. `handle_command` receives the
/// current state by value and returns the candidate next state alongside the
/// reply; a failure reply discards the candidate and leaves state untouched.
pub trait ValueEntityBehavior: Send + Sync + 'static {
    type State: Clone + Send + Sync + 'static;

    fn initial_state(&self, entity_id: &str) -> Self::State;

    fn handle_command(
        &self,
        state: Self::State,
        ctx: &mut CommandContext,
        command_name: &str,
        payload: AnyValue,
    ) -> Result<(Self::State, Reply), RuntimeError>;

    fn encode_state(&self, state: &Self::State) -> AnyValue;
    fn decode_state(&self, value: &AnyValue) -> Result<Self::State, RuntimeError>;
}

/// A single value-entity instance, identified by entity id.
pub struct ValueEntityInstance<B: ValueEntityBehavior> {
    entity_id: String,
    state: B::State,
}

impl<B: ValueEntityBehavior> ValueEntityInstance<B> {
    pub fn new(entity_id: impl Into<String>, behavior: &B) -> Self {
        let entity_id = entity_id.into();
        let state = behavior.initial_state(&entity_id);
        Self { entity_id, state }
    }

    pub fn state(&self) -> &B::State {
        &self.state
    }

    /// Restores an instance from a previously persisted state, e.g. after
    /// passivation, without re-running `initial_state`.
    pub fn restore(entity_id: impl Into<String>, state: B::State) -> Self {
        Self {
            entity_id: entity_id.into(),
            state,
        }
    }

    pub fn handle_command(
        &mut self,
        behavior: &B,
        command_name: &str,
        payload: AnyValue,
        metadata: statefun_core::Metadata,
    ) -> Result<Reply, RuntimeError> {
        let mut ctx = CommandContext::new(self.entity_id.clone(), command_name, metadata);
        let (next_state, reply) =
            behavior.handle_command(self.state.clone(), &mut ctx, command_name, payload)?;
        if !reply.is_failure() {
            self.state = next_state;
        }
        Ok(reply.add_effects(ctx.into_effects()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statefun_core::Metadata;

    struct Counter;

    impl ValueEntityBehavior for Counter {
        type State = i64;

        fn initial_state(&self, _entity_id: &str) -> i64 {
            0
        }

        fn handle_command(
            &self,
            state: i64,
            _ctx: &mut CommandContext,
            command_name: &str,
            _payload: AnyValue,
        ) -> Result<(i64, Reply), RuntimeError> {
            match command_name {
                "Increment" => Ok((state + 1, Reply::message(AnyValue::encode_i64(state + 1)))),
                "Fail" => Ok((state, Reply::failure("nope", None))),
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

    #[test]
    fn successful_command_commits_new_state() {
        let behavior = Counter;
        let mut instance = ValueEntityInstance::new("c-1", &behavior);
        instance
            .handle_command(&behavior, "Increment", AnyValue::encode_bool(true), Metadata::new())
            .unwrap();
        assert_eq!(*instance.state(), 1);
    }

    #[test]
    fn failed_command_leaves_state_untouched() {
        let behavior = Counter;
        let mut instance = ValueEntityInstance::new("c-1", &behavior);
        instance
            .handle_command(&behavior, "Increment", AnyValue::encode_bool(true), Metadata::new())
            .unwrap();
        let reply = instance
            .handle_command(&behavior, "Fail", AnyValue::encode_bool(true), Metadata::new())
            .unwrap();
        assert!(reply.is_failure());
        assert_eq!(*instance.state(), 1);
    }

    #[test]
    fn restore_skips_initial_state_and_resumes_from_the_snapshot() {
        let behavior = Counter;
        let snapshot = behavior.decode_state(&behavior.encode_state(&41)).unwrap();
        let mut instance = ValueEntityInstance::restore("c-1", snapshot);
        assert_eq!(*instance.state(), 41);
        instance
            .handle_command(&behavior, "Increment", AnyValue::encode_bool(true), Metadata::new())
            .unwrap();
        assert_eq!(*instance.state(), 42);
    }
}
