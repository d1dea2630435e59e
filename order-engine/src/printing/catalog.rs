//! Print group configuration cache
//!
//! Read-mostly configuration shared across dispatches. Items reference
//! groups by id only; the catalog is the lookup side of that weak
//! relation.

use dashmap::DashMap;
use shared::models::{PrintGroup, PrintGroupUpdate};

/// In-memory print group catalog
#[derive(Debug, Default)]
pub struct PrintGroupCatalog {
    groups: DashMap<i64, PrintGroup>,
}

impl PrintGroupCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from existing configuration
    pub fn with_groups(groups: Vec<PrintGroup>) -> Self {
        let catalog = Self::new();
        for group in groups {
            catalog.upsert(group);
        }
        catalog
    }

    /// Resolve a group id to its configuration
    pub fn resolve(&self, id: i64) -> Option<PrintGroup> {
        self.groups.get(&id).map(|g| g.clone())
    }

    /// Insert or replace a group
    pub fn upsert(&self, group: PrintGroup) {
        self.groups.insert(group.id, group);
    }

    /// Apply a partial update; returns false when the group is unknown
    pub fn update(&self, id: i64, update: PrintGroupUpdate) -> bool {
        let Some(mut group) = self.groups.get_mut(&id) else {
            return false;
        };
        if let Some(name) = update.name {
            group.name = name;
        }
        if let Some(addr) = update.printer_address {
            group.printer_address = addr;
        }
        if let Some(color) = update.color_code {
            group.color_code = Some(color);
        }
        if let Some(active) = update.is_active {
            group.is_active = active;
        }
        true
    }

    /// Remove a group from the catalog
    pub fn remove(&self, id: i64) -> Option<PrintGroup> {
        self.groups.remove(&id).map(|(_, g)| g)
    }

    /// All configured groups
    pub fn list(&self) -> Vec<PrintGroup> {
        let mut groups: Vec<PrintGroup> = self.groups.iter().map(|g| g.clone()).collect();
        groups.sort_by_key(|g| g.id);
        groups
    }
}
