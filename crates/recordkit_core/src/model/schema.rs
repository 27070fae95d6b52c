//! Entity kind registry.
//!
//! # Responsibility
//! - Name the entity kinds a store accepts.
//! - Resolve a kind to itself plus its sub-entities for queries.
//!
//! # Invariants
//! - A parent kind is registered before any of its sub-entities.
//! - Kind names are unique.

use std::collections::BTreeMap;

/// One registered entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescription {
    pub name: String,
    pub parent: Option<String>,
}

/// Schema model of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    entities: BTreeMap<String, EntityDescription>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.entities.contains_key(kind)
    }

    pub fn entity(&self, kind: &str) -> Option<&EntityDescription> {
        self.entities.get(kind)
    }

    /// Returns `kind` and, when `include_subentities`, every descendant kind.
    ///
    /// Returns `None` when `kind` is not registered.
    pub fn resolve_kinds(&self, kind: &str, include_subentities: bool) -> Option<Vec<String>> {
        if !self.contains(kind) {
            return None;
        }

        let mut kinds = vec![kind.to_string()];
        if include_subentities {
            let mut cursor = 0;
            while cursor < kinds.len() {
                let current = kinds[cursor].clone();
                kinds.extend(
                    self.entities
                        .values()
                        .filter(|entity| entity.parent.as_deref() == Some(current.as_str()))
                        .map(|entity| entity.name.clone()),
                );
                cursor += 1;
            }
        }
        Some(kinds)
    }
}

/// Builder validating registration order.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    entities: BTreeMap<String, EntityDescription>,
    errors: Vec<String>,
}

impl ModelBuilder {
    /// Registers a root entity kind.
    pub fn entity(self, name: impl Into<String>) -> Self {
        self.register(name.into(), None)
    }

    /// Registers `name` as a sub-entity of the already registered `parent`.
    pub fn subentity(self, name: impl Into<String>, parent: impl Into<String>) -> Self {
        self.register(name.into(), Some(parent.into()))
    }

    /// Finishes the model, reporting every registration problem at once.
    pub fn build(self) -> Result<Model, String> {
        if !self.errors.is_empty() {
            return Err(self.errors.join("; "));
        }
        Ok(Model {
            entities: self.entities,
        })
    }

    fn register(mut self, name: String, parent: Option<String>) -> Self {
        if name.trim().is_empty() {
            self.errors.push("entity name cannot be empty".to_string());
            return self;
        }
        if self.entities.contains_key(&name) {
            self.errors.push(format!("entity `{name}` registered twice"));
            return self;
        }
        if let Some(parent_name) = parent.as_deref() {
            if !self.entities.contains_key(parent_name) {
                self.errors.push(format!(
                    "entity `{name}` names unknown parent `{parent_name}`"
                ));
                return self;
            }
        }
        self.entities
            .insert(name.clone(), EntityDescription { name, parent });
        self
    }
}
