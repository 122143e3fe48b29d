//! Per-runtime component registry. Collections are owned by a `Host`
//! instance, never process-global.

use crate::component::ComponentDescription;
use std::sync::Arc;

/// Accepts component registrations before `start()`; `finish` freezes the
/// set into a read-only, cheaply-shareable snapshot.
#[derive(Default)]
pub struct ComponentRegistry {
    components: Vec<ComponentDescription>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, component: ComponentDescription) -> &mut Self {
        self.components.push(component);
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Freezes the registry. The descriptor pool and component registry are
    /// read-only after `start()`; `Arc` makes that sharing explicit.
    pub fn finish(self) -> Arc<[ComponentDescription]> {
        self.components.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_finish_preserves_order() {
        let mut registry = ComponentRegistry::new();
        registry.register(ComponentDescription::action("a"));
        registry.register(ComponentDescription::action("b"));
        let frozen = registry.finish();
        assert_eq!(frozen[0].service_name, "a");
        assert_eq!(frozen[1].service_name, "b");
    }
}
