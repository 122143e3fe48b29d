//! The context handed to a handler on every command invocation: identity of
//! the entity instance, inbound metadata, and a place to stash effects.

use statefun_core::{Effect, Metadata};

/// Per-call context passed to every command handler. Handlers read metadata
/// and entity identity from it and queue side effects on it; the instance
/// collects those effects into the final [`statefun_core::Reply`].
pub struct CommandContext {
    entity_id: String,
    command_name: String,
    metadata: Metadata,
    effects: Vec<Effect>,
}

impl CommandContext {
    pub fn new(entity_id: impl Into<String>, command_name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            entity_id: entity_id.into(),
            command_name: command_name.into(),
            metadata,
            effects: Vec::new(),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn emit_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_has_no_effects() {
        let ctx = CommandContext::new("entity-1", "DoThing", Metadata::new());
        assert!(ctx.into_effects().is_empty());
    }
}
