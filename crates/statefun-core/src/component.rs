//! Static component descriptions, registered before `start()`.

use std::time::Duration;

/// The kind of a registered component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Action,
    ValueEntity,
    EventSourcedEntity,
    ReplicatedEntity,
    View,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteConsistency {
    Local,
    Majority,
    All,
}

/// Entity-specific configuration, present only for the four stateful kinds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityConfig {
    pub entity_type: String,
    pub passivation_timeout: Option<u64>,
    pub forward_headers: Vec<String>,
    pub replicated_write_consistency: Option<WriteConsistency>,
    pub snapshot_every: Option<u32>,
}

/// A component as registered before startup. `component_type` is a static
/// attribute fixed at registration (see DESIGN.md: treated as static, not a
/// dynamically-retaggable property).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentDescription {
    pub service_name: String,
    pub component_type: ComponentKind,
    pub entity: Option<EntityConfig>,
}

impl ComponentDescription {
    pub fn action(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            component_type: ComponentKind::Action,
            entity: None,
        }
    }

    pub fn value_entity(service_name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self::stateful(ComponentKind::ValueEntity, service_name, entity_type)
    }

    pub fn event_sourced_entity(
        service_name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self::stateful(ComponentKind::EventSourcedEntity, service_name, entity_type)
    }

    pub fn replicated_entity(
        service_name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self::stateful(ComponentKind::ReplicatedEntity, service_name, entity_type)
    }

    pub fn view(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            component_type: ComponentKind::View,
            entity: None,
        }
    }

    fn stateful(
        kind: ComponentKind,
        service_name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            component_type: kind,
            entity: Some(EntityConfig {
                entity_type: entity_type.into(),
                ..Default::default()
            }),
        }
    }

    pub fn with_passivation_timeout(mut self, timeout: Duration) -> Self {
        if let Some(entity) = &mut self.entity {
            entity.passivation_timeout = Some(timeout.as_millis() as u64);
        }
        self
    }

    pub fn with_forward_headers(mut self, headers: impl IntoIterator<Item = String>) -> Self {
        if let Some(entity) = &mut self.entity {
            entity.forward_headers = headers.into_iter().collect();
        }
        self
    }

    pub fn with_write_consistency(mut self, consistency: WriteConsistency) -> Self {
        if let Some(entity) = &mut self.entity {
            entity.replicated_write_consistency = Some(consistency);
        }
        self
    }

    pub fn with_snapshot_every(mut self, n: u32) -> Self {
        if let Some(entity) = &mut self.entity {
            entity.snapshot_every = Some(n);
        }
        self
    }
}
