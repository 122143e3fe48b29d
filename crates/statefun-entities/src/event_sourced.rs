//! Event-sourced entities: commands emit events, events are the only thing
//! ever applied to state, and state is rebuilt by replaying the event
//! journal (or a snapshot plus the events after it).

use crate::context::CommandContext;
use statefun_any::AnyValue;
use statefun_core::{Metadata, Reply, RuntimeError};

/// User-supplied behavior for an event-sourced entity.
pub trait EventSourcedBehavior: Send + Sync + 'static {
    type State: Clone + Send + Sync + 'static;
    type Event: Clone + Send + Sync + 'static;

    fn initial_state(&self, entity_id: &str) -> Self::State;

    /// Validates the command against the current state and returns the
    /// events it produces plus the reply; state is untouched here. Events
    /// are applied afterward, in order, via `apply_event`.
    fn handle_command(
        &self,
        state: &Self::State,
        ctx: &mut CommandContext,
        command_name: &str,
        payload: AnyValue,
    ) -> Result<(Vec<Self::Event>, Reply), RuntimeError>;

    /// Folds one event into the state. Must be deterministic and side-effect
    /// free: it runs both on the live path and during journal replay.
    fn apply_event(&self, state: &mut Self::State, event: &Self::Event);

    fn encode_event(&self, event: &Self::Event) -> AnyValue;
    fn decode_event(&self, value: &AnyValue) -> Result<Self::Event, RuntimeError>;

    fn encode_snapshot(&self, state: &Self::State) -> AnyValue;
    fn decode_snapshot(&self, value: &AnyValue) -> Result<Self::State, RuntimeError>;
}

/// Returns true once enough events have accumulated since the last snapshot
/// to justify writing a new one. `snapshot_every` of `0` or `None` disables
/// snapshotting; the entity is always rebuilt from the full journal.
pub fn should_snapshot(events_since_snapshot: u32, snapshot_every: Option<u32>) -> bool {
    match snapshot_every {
        Some(n) if n > 0 => events_since_snapshot >= n,
        _ => false,
    }
}

pub struct EventSourcedInstance<B: EventSourcedBehavior> {
    entity_id: String,
    state: B::State,
    events_since_snapshot: u32,
    snapshot_every: Option<u32>,
}

impl<B: EventSourcedBehavior> EventSourcedInstance<B> {
    pub fn new(entity_id: impl Into<String>, behavior: &B, snapshot_every: Option<u32>) -> Self {
        let entity_id = entity_id.into();
        let state = behavior.initial_state(&entity_id);
        Self {
            entity_id,
            state,
            events_since_snapshot: 0,
            snapshot_every,
        }
    }

    pub fn state(&self) -> &B::State {
        &self.state
    }

    /// Rebuilds an instance from a snapshot plus the events that followed it.
    pub fn restore_from_snapshot(
        entity_id: impl Into<String>,
        behavior: &B,
        snapshot: B::State,
        events_since: impl IntoIterator<Item = B::Event>,
        snapshot_every: Option<u32>,
    ) -> Self {
        let mut instance = Self {
            entity_id: entity_id.into(),
            state: snapshot,
            events_since_snapshot: 0,
            snapshot_every,
        };
        for event in events_since {
            behavior.apply_event(&mut instance.state, &event);
            instance.events_since_snapshot += 1;
        }
        instance
    }

    /// Replays a full event journal from the empty initial state.
    pub fn replay(entity_id: impl Into<String>, behavior: &B, events: impl IntoIterator<Item = B::Event>) -> Self {
        let entity_id = entity_id.into();
        let mut state = behavior.initial_state(&entity_id);
        let mut count = 0u32;
        for event in events {
            behavior.apply_event(&mut state, &event);
            count += 1;
        }
        Self {
            entity_id,
            state,
            events_since_snapshot: count,
            snapshot_every: None,
        }
    }

    /// Handles one command: produces events, applies them in order, and
    /// reports whether the instance should now be snapshotted.
    pub fn handle_command(
        &mut self,
        behavior: &B,
        command_name: &str,
        payload: AnyValue,
        metadata: Metadata,
    ) -> Result<(Reply, Vec<B::Event>, bool), RuntimeError> {
        let mut ctx = CommandContext::new(self.entity_id.clone(), command_name, metadata);
        let (events, reply) =
            behavior.handle_command(&self.state, &mut ctx, command_name, payload)?;
        for event in &events {
            behavior.apply_event(&mut self.state, event);
            self.events_since_snapshot += 1;
        }
        let snapshot_due = should_snapshot(self.events_since_snapshot, self.snapshot_every);
        if snapshot_due {
            self.events_since_snapshot = 0;
        }
        Ok((reply.add_effects(ctx.into_effects()), events, snapshot_due))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum CounterEvent {
        Incremented,
    }

    struct Counter;

    impl EventSourcedBehavior for Counter {
        type State = i64;
        type Event = CounterEvent;

        fn initial_state(&self, _entity_id: &str) -> i64 {
            0
        }

        fn handle_command(
            &self,
            state: &i64,
            _ctx: &mut CommandContext,
            command_name: &str,
            _payload: AnyValue,
        ) -> Result<(Vec<CounterEvent>, Reply), RuntimeError> {
            match command_name {
                "Increment" => Ok((
                    vec![CounterEvent::Incremented],
                    Reply::message(AnyValue::encode_i64(state + 1)),
                )),
                other => Err(RuntimeError::UnknownCommandType(other.to_string())),
            }
        }

        fn apply_event(&self, state: &mut i64, event: &CounterEvent) {
            match event {
                CounterEvent::Incremented => *state += 1,
            }
        }

        fn encode_event(&self, _event: &CounterEvent) -> AnyValue {
            AnyValue::encode_bool(true)
        }

        fn decode_event(&self, _value: &AnyValue) -> Result<CounterEvent, RuntimeError> {
            Ok(CounterEvent::Incremented)
        }

        fn encode_snapshot(&self, state: &i64) -> AnyValue {
            AnyValue::encode_i64(*state)
        }

        fn decode_snapshot(&self, value: &AnyValue) -> Result<i64, RuntimeError> {
            Ok(value.decode_i64()?)
        }
    }

    #[test]
    fn events_accumulate_and_trigger_snapshot() {
        let behavior = Counter;
        let mut instance = EventSourcedInstance::new("c-1", &behavior, Some(2));
        let (_, _, due) = instance
            .handle_command(&behavior, "Increment", AnyValue::encode_bool(true), Metadata::new())
            .unwrap();
        assert!(!due);
        let (_, _, due) = instance
            .handle_command(&behavior, "Increment", AnyValue::encode_bool(true), Metadata::new())
            .unwrap();
        assert!(due);
        assert_eq!(*instance.state(), 2);
    }

    #[test]
    fn restore_from_snapshot_replays_only_the_events_after_it() {
        let behavior = Counter;
        let snapshot = behavior.decode_snapshot(&behavior.encode_snapshot(&5)).unwrap();
        let instance = EventSourcedInstance::restore_from_snapshot(
            "c-1",
            &behavior,
            snapshot,
            vec![CounterEvent::Incremented],
            Some(2),
        );
        assert_eq!(*instance.state(), 6);
    }

    #[test]
    fn replay_reproduces_state_from_scratch() {
        let behavior = Counter;
        let events = vec![CounterEvent::Incremented, CounterEvent::Incremented, CounterEvent::Incremented];
        let instance = EventSourcedInstance::replay("c-1", &behavior, events);
        assert_eq!(*instance.state(), 3);
    }

    #[test]
    fn snapshot_disabled_never_fires() {
        assert!(!should_snapshot(1_000_000, None));
        assert!(!should_snapshot(5, Some(0)));
    }
}
