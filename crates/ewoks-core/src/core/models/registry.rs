use super::ids::ProteinId;
use super::protein::{ModelError, ProteinEntity};
use serde::Deserialize;
use slotmap::SlotMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// How a registry reacts when an entity is registered under an existing entry name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail with [`ModelError::DuplicateEntry`].
    #[default]
    Reject,
    /// Replace the existing entity (last write wins).
    Replace,
}

/// The population of one workflow run: entities keyed by entry name.
///
/// Iteration follows insertion order. Entities are never removed by the separation
/// operations, only by [`Registry::clear`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Primary storage for entities.
    proteins: SlotMap<ProteinId, ProteinEntity>,
    /// Insertion order of the live entities.
    order: Vec<ProteinId>,
    /// Lookup map from entry name to its stable ID.
    name_map: HashMap<String, ProteinId>,
    /// Identifier of the population the entities were loaded from (e.g. a UniProt proteome).
    reference_population: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity under its entry name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateEntry`] if the name is already taken.
    pub fn insert(&mut self, entity: ProteinEntity) -> Result<ProteinId, ModelError> {
        if self.name_map.contains_key(entity.entry_name()) {
            return Err(ModelError::DuplicateEntry(entity.entry_name().to_string()));
        }
        let name = entity.entry_name().to_string();
        let id = self.proteins.insert(entity);
        self.order.push(id);
        self.name_map.insert(name, id);
        Ok(id)
    }

    /// Registers an entity, replacing any entity with the same entry name in place.
    ///
    /// Returns the replaced entity, if any.
    pub fn upsert(&mut self, entity: ProteinEntity) -> Option<ProteinEntity> {
        match self.name_map.get(entity.entry_name()) {
            Some(&id) => {
                warn!(
                    "Replacing existing entry '{}' in population.",
                    entity.entry_name()
                );
                self.proteins
                    .get_mut(id)
                    .map(|slot| std::mem::replace(slot, entity))
            }
            None => {
                let name = entity.entry_name().to_string();
                let id = self.proteins.insert(entity);
                self.order.push(id);
                self.name_map.insert(name, id);
                None
            }
        }
    }

    /// Registers an entity according to `policy`.
    pub fn register(
        &mut self,
        entity: ProteinEntity,
        policy: DuplicatePolicy,
    ) -> Result<(), ModelError> {
        match policy {
            DuplicatePolicy::Reject => self.insert(entity).map(|_| ()),
            DuplicatePolicy::Replace => {
                self.upsert(entity);
                Ok(())
            }
        }
    }

    pub fn get(&self, entry_name: &str) -> Option<&ProteinEntity> {
        self.name_map
            .get(entry_name)
            .and_then(|&id| self.proteins.get(id))
    }

    pub fn get_mut(&mut self, entry_name: &str) -> Option<&mut ProteinEntity> {
        match self.name_map.get(entry_name) {
            Some(&id) => self.proteins.get_mut(id),
            None => None,
        }
    }

    pub fn contains(&self, entry_name: &str) -> bool {
        self.name_map.contains_key(entry_name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Snapshot of all entities in insertion order.
    pub fn get_all(&self) -> Vec<&ProteinEntity> {
        self.iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProteinEntity> {
        self.order.iter().filter_map(|&id| self.proteins.get(id))
    }

    /// Mutable iteration over all entities in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProteinEntity> {
        let position: HashMap<ProteinId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();
        let mut entries: Vec<_> = self.proteins.iter_mut().collect();
        entries.sort_unstable_by_key(|(id, _)| position.get(id).copied().unwrap_or(usize::MAX));
        entries.into_iter().map(|(_, protein)| protein)
    }

    /// Total abundance over all entities.
    pub fn total_abundance(&self) -> f64 {
        self.iter().map(ProteinEntity::abundance).sum()
    }

    /// Empties the population and unsets the reference population.
    pub fn clear(&mut self) {
        debug!("Clearing population of {} entities.", self.len());
        self.proteins = SlotMap::with_key();
        self.order.clear();
        self.name_map.clear();
        self.reference_population = None;
    }

    pub fn reference_population(&self) -> Option<&str> {
        self.reference_population.as_deref()
    }

    /// Records the population identifier on first load.
    ///
    /// Returns `false` and keeps the existing value if one is already set.
    pub fn set_reference_population(&mut self, id: impl Into<String>) -> bool {
        if self.reference_population.is_some() {
            return false;
        }
        self.reference_population = Some(id.into());
        true
    }
}
