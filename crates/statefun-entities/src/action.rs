//! Actions: stateless handlers with no entity identity and no persisted
//! state. A single [`ActionContext`] lives for the whole `Handle` stream, not
//! one inbound command, so a behavior can implement any of the four call
//! shapes the wire protocol allows: unary (one command, one reply), streamed
//! in (many commands, one reply on end-of-input), streamed out (one command,
//! many replies), or bidirectional (any mix of the two).

use statefun_any::AnyValue;
use statefun_core::{Effect, EffectPayload, Metadata, Reply, RuntimeError};

/// Per-stream context handed to an action's handler. Replies are queued
/// rather than returned directly, since a single inbound command may produce
/// zero, one, or many of them; the host flushes whatever is queued to the
/// outbound stream after each call into the behavior.
pub struct ActionContext {
    metadata: Metadata,
    effects: Vec<Effect>,
    pending: Vec<Reply>,
}

impl ActionContext {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            effects: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Swaps in the metadata of the inbound command currently being handled.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    pub fn emit_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Queues a message reply, carrying any effects emitted since the
    /// previous queued reply.
    pub fn write(&mut self, value: AnyValue) {
        let effects = self.take_effects();
        self.pending.push(Reply::message(value).add_effects(effects));
    }

    /// Queues a failure reply.
    pub fn fail(&mut self, description: impl Into<String>) {
        let effects = self.take_effects();
        self.pending
            .push(Reply::failure(description, None).add_effects(effects));
    }

    /// Queues a forwarding reply.
    pub fn forward(&mut self, call: EffectPayload, metadata: Metadata) {
        let effects = self.take_effects();
        self.pending
            .push(Reply::forward(call, metadata).add_effects(effects));
    }

    /// Drains every reply queued since the last drain, in emission order.
    pub fn drain_replies(&mut self) -> Vec<Reply> {
        std::mem::take(&mut self.pending)
    }
}

/// User-supplied behavior for an action. None of the methods receive or
/// return a `Reply` directly; they write to `ctx` instead, which is how a
/// single inbound command can produce many replies (streamed out) and many
/// inbound commands can produce a single reply (streamed in).
pub trait ActionBehavior: Send + Sync + 'static {
    /// Handles one inbound command. Unary and bidirectional behaviors
    /// typically call `ctx.write`/`ctx.fail` here directly; a streamed-in
    /// behavior instead accumulates into its own state and replies from
    /// `handle_end_of_input`.
    fn handle_command(
        &self,
        ctx: &mut ActionContext,
        command_name: &str,
        payload: AnyValue,
    ) -> Result<(), RuntimeError>;

    /// Called once, after the inbound stream has closed and its last
    /// `handle_command` has returned. The default is a no-op, correct for
    /// unary and streamed-out behaviors that already replied per command.
    fn handle_end_of_input(&self, _ctx: &mut ActionContext) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Called if the outbound stream is cancelled before the inbound side
    /// closes normally. Default is a no-op.
    fn handle_cancel(&self, _ctx: &mut ActionContext) {}
}

/// Invokes an action's handler for a single command, bridging the
/// `ActionContext`'s queue back to a one-reply-per-call shape. Used by
/// unary call sites that want exactly the first queued reply.
pub fn invoke(
    behavior: &dyn ActionBehavior,
    command_name: &str,
    payload: AnyValue,
    metadata: Metadata,
) -> Result<Reply, RuntimeError> {
    let mut ctx = ActionContext::new(metadata);
    behavior.handle_command(&mut ctx, command_name, payload)?;
    Ok(ctx
        .drain_replies()
        .into_iter()
        .next()
        .unwrap_or_else(Reply::no_reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl ActionBehavior for Echo {
        fn handle_command(
            &self,
            ctx: &mut ActionContext,
            _command_name: &str,
            payload: AnyValue,
        ) -> Result<(), RuntimeError> {
            ctx.write(payload);
            Ok(())
        }
    }

    #[test]
    fn invoke_runs_handler_without_an_entity_id() {
        let reply = invoke(&Echo, "Echo", AnyValue::encode_string("hi"), Metadata::new()).unwrap();
        match reply.outcome() {
            statefun_core::ReplyOutcome::Message(v) => assert_eq!(v.decode_string().unwrap(), "hi"),
            _ => panic!("expected message reply"),
        }
    }

    /// Streamed out: a single inbound command fans out into several replies.
    struct Ping;

    impl ActionBehavior for Ping {
        fn handle_command(
            &self,
            ctx: &mut ActionContext,
            _command_name: &str,
            _payload: AnyValue,
        ) -> Result<(), RuntimeError> {
            for _ in 0..3 {
                ctx.write(AnyValue::encode_string("pong"));
            }
            Ok(())
        }
    }

    #[test]
    fn one_command_can_queue_several_replies() {
        let mut ctx = ActionContext::new(Metadata::new());
        Ping.handle_command(&mut ctx, "Ping", AnyValue::encode_bool(true)).unwrap();
        assert_eq!(ctx.drain_replies().len(), 3);
    }

    /// Streamed in: replies accumulate across commands and flush once, at
    /// end of input.
    struct Sum {
        total: std::sync::Mutex<i64>,
    }

    impl Sum {
        fn new() -> Self {
            Self { total: std::sync::Mutex::new(0) }
        }
    }

    impl ActionBehavior for Sum {
        fn handle_command(
            &self,
            _ctx: &mut ActionContext,
            _command_name: &str,
            payload: AnyValue,
        ) -> Result<(), RuntimeError> {
            *self.total.lock().unwrap() += payload.decode_i64()?;
            Ok(())
        }

        fn handle_end_of_input(&self, ctx: &mut ActionContext) -> Result<(), RuntimeError> {
            ctx.write(AnyValue::encode_i64(*self.total.lock().unwrap()));
            Ok(())
        }
    }

    #[test]
    fn streamed_in_replies_once_at_end_of_input() {
        let sum = Sum::new();
        let mut ctx = ActionContext::new(Metadata::new());
        for n in [1, 2, 3] {
            sum.handle_command(&mut ctx, "Add", AnyValue::encode_i64(n)).unwrap();
        }
        assert!(ctx.drain_replies().is_empty());
        sum.handle_end_of_input(&mut ctx).unwrap();
        let replies = ctx.drain_replies();
        assert_eq!(replies.len(), 1);
        match replies[0].outcome() {
            statefun_core::ReplyOutcome::Message(v) => assert_eq!(v.decode_i64().unwrap(), 6),
            _ => panic!("expected message reply"),
        }
    }

    #[test]
    fn cancel_defaults_to_a_no_op() {
        let mut ctx = ActionContext::new(Metadata::new());
        Echo.handle_cancel(&mut ctx);
        assert!(ctx.drain_replies().is_empty());
    }
}
