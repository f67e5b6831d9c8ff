//! Entity registry mapping route segments to searchable entities

use crate::core::entity::EntityDescriptor;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry for all searchable entities in the application
///
/// Entities are keyed by their plural route segment (`/users/search` looks up
/// `users`) and kept in registration order.
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    descriptors: IndexMap<String, Arc<EntityDescriptor>>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            descriptors: IndexMap::new(),
        }
    }

    /// Register an entity descriptor
    ///
    /// A descriptor with the same plural replaces the previous one, which is
    /// returned.
    pub fn register(&mut self, descriptor: EntityDescriptor) -> Option<Arc<EntityDescriptor>> {
        let plural = descriptor.plural().to_string();
        self.descriptors.insert(plural, Arc::new(descriptor))
    }

    /// Look up an entity by its route segment
    pub fn get(&self, plural: &str) -> Option<Arc<EntityDescriptor>> {
        self.descriptors.get(plural).cloned()
    }

    /// Get all registered entity types (singular names)
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.values().map(|d| d.name()).collect()
    }

    /// Get all registered route segments
    pub fn plurals(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl FromIterator<EntityDescriptor> for EntityRegistry {
    fn from_iter<I: IntoIterator<Item = EntityDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        for descriptor in iter {
            registry.register(descriptor);
        }
        registry
    }
}
