//! Reply builder: assembles a command outcome as message / forward /
//! failure / no-reply, plus side effects and metadata.

use crate::effect::{Effect, EffectPayload};
use crate::metadata::Metadata;
use statefun_any::AnyValue;

#[derive(Clone, Debug, PartialEq)]
pub enum ReplyOutcome {
    Message(AnyValue),
    Forward(EffectPayload, Metadata),
    Failure { message: String, grpc_status: Option<i32> },
    NoReply,
}

/// Immutable-style builder for a command reply. A reply carries at most one
/// of {message, forward, failure}; effects may accompany any of them.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    outcome: ReplyOutcome,
    effects: Vec<Effect>,
}

impl Reply {
    pub fn message(value: AnyValue) -> Self {
        Self {
            outcome: ReplyOutcome::Message(value),
            effects: Vec::new(),
        }
    }

    pub fn forward(call: EffectPayload, metadata: Metadata) -> Self {
        Self {
            outcome: ReplyOutcome::Forward(call, metadata),
            effects: Vec::new(),
        }
    }

    pub fn failure(description: impl Into<String>, grpc_status: Option<i32>) -> Self {
        Self {
            outcome: ReplyOutcome::Failure {
                message: description.into(),
                grpc_status,
            },
            effects: Vec::new(),
        }
    }

    pub fn no_reply() -> Self {
        Self {
            outcome: ReplyOutcome::NoReply,
            effects: Vec::new(),
        }
    }

    pub fn add_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn outcome(&self) -> &ReplyOutcome {
        &self.outcome
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ReplyOutcome::Failure { .. })
    }
}
