//! Capability registry - Holds the capabilities available to the dispatcher

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    Capability, ComprehensiveCapability, ConversationalCapability, DatabaseQueryCapability,
    LocationClarificationCapability, PropertySearchCapability, SmartLocationSearchCapability,
};
use crate::application::services::ListingService;

/// Registry of capabilities keyed by name
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// Register a capability, replacing any previous one with the same name
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Option<Arc<dyn Capability>> {
        let name = capability.name().to_string();
        let previous = self.capabilities.insert(name.clone(), capability);
        if previous.is_some() {
            tracing::warn!("Capability '{}' was already registered, replacing it", name);
        } else {
            tracing::debug!("Registered capability: {}", name);
        }
        previous
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Capability>> {
        let removed = self.capabilities.remove(name);
        if removed.is_some() {
            tracing::info!("Unregistered capability: {}", name);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    /// Capabilities in evaluation order: priority, then name
    pub fn ordered(&self) -> Vec<Arc<dyn Capability>> {
        let mut list: Vec<Arc<dyn Capability>> = self.capabilities.values().cloned().collect();
        list.sort_by(|a, b| a.priority().cmp(&b.priority()).then_with(|| a.name().cmp(b.name())));
        list
    }

    /// Names in evaluation order
    pub fn names(&self) -> Vec<String> {
        self.ordered().iter().map(|c| c.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// All built-in capabilities
pub fn default_registry(listings: Arc<ListingService>) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register(Arc::new(ConversationalCapability::new()));
    registry.register(Arc::new(LocationClarificationCapability::new(listings.clone())));
    registry.register(Arc::new(SmartLocationSearchCapability::new(listings.clone())));
    registry.register(Arc::new(ComprehensiveCapability::new(listings.clone())));
    registry.register(Arc::new(PropertySearchCapability::new(listings.clone())));
    registry.register(Arc::new(DatabaseQueryCapability::new(listings)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::capabilities::CapabilityContext;
    use crate::application::errors::ChatError;
    use crate::domain::entities::{Message, Response};
    use async_trait::async_trait;

    struct Named(&'static str, i32);

    #[async_trait]
    impl Capability for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test"
        }

        fn priority(&self) -> i32 {
            self.1
        }

        fn can_handle(&self, _message: &Message, _ctx: &CapabilityContext) -> bool {
            true
        }

        async fn process(&self, _message: &Message, _ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
            Ok(Response::conversational(self.0))
        }
    }

    #[test]
    fn test_ordering_by_priority_then_name() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Named("zeta", 10)));
        registry.register(Arc::new(Named("alpha", 50)));
        registry.register(Arc::new(Named("beta", 10)));
        assert_eq!(registry.names(), vec!["beta", "zeta", "alpha"]);
    }

    #[test]
    fn test_register_replaces_and_unregister_removes() {
        let mut registry = CapabilityRegistry::new();
        assert!(registry.register(Arc::new(Named("a", 1))).is_none());
        assert!(registry.register(Arc::new(Named("a", 5))).is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").map(|c| c.priority()), Some(5));

        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        assert!(registry.is_empty());
    }
}
