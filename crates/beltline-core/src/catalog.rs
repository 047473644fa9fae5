//! The static item catalog.
//!
//! Item types are registered once at startup through [`ItemCatalogBuilder`]
//! and frozen into an [`ItemCatalog`]. At simulation time the catalog is
//! read-only: lanes only ever carry [`ItemTypeId`]s, and names are resolved
//! through [`ItemCatalog::item`].

use crate::id::ItemTypeId;
use std::collections::HashMap;

/// An item type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDef {
    pub name: String,
    /// Sprite key handed to the renderer. Defaults to the item name.
    pub sprite: String,
}

/// Errors from catalog construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("item registered twice: {0}")]
    DuplicateItem(String),
}

/// Builder for constructing an immutable [`ItemCatalog`].
#[derive(Debug, Default)]
pub struct ItemCatalogBuilder {
    items: Vec<ItemDef>,
    name_to_id: HashMap<String, ItemTypeId>,
}

impl ItemCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item type whose sprite shares its name.
    pub fn register(&mut self, name: &str) -> Result<ItemTypeId, CatalogError> {
        self.register_with_sprite(name, name)
    }

    /// Register an item type with an explicit sprite key.
    pub fn register_with_sprite(
        &mut self,
        name: &str,
        sprite: &str,
    ) -> Result<ItemTypeId, CatalogError> {
        if self.name_to_id.contains_key(name) {
            return Err(CatalogError::DuplicateItem(name.to_string()));
        }
        let id = ItemTypeId(self.items.len() as u32);
        self.items.push(ItemDef {
            name: name.to_string(),
            sprite: sprite.to_string(),
        });
        self.name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn build(self) -> ItemCatalog {
        ItemCatalog {
            items: self.items,
            name_to_id: self.name_to_id,
        }
    }
}

/// Immutable item catalog. Frozen after [`ItemCatalogBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: Vec<ItemDef>,
    name_to_id: HashMap<String, ItemTypeId>,
}

impl ItemCatalog {
    /// Look up an item by name.
    pub fn item(&self, name: &str) -> Result<ItemTypeId, CatalogError> {
        self.id(name)
            .ok_or_else(|| CatalogError::UnknownItem(name.to_string()))
    }

    pub fn id(&self, name: &str) -> Option<ItemTypeId> {
        self.name_to_id.get(name).copied()
    }

    pub fn get(&self, id: ItemTypeId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate item definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemTypeId, &ItemDef)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, def)| (ItemTypeId(i as u32), def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemCatalog {
        let mut builder = ItemCatalogBuilder::new();
        builder.register("ironPlate").unwrap();
        builder.register_with_sprite("yellowBelt", "belt_yellow").unwrap();
        builder.build()
    }

    #[test]
    fn lookup_by_name() {
        let catalog = sample();
        assert_eq!(catalog.item("ironPlate"), Ok(ItemTypeId(0)));
        assert_eq!(catalog.item("yellowBelt"), Ok(ItemTypeId(1)));
        assert_eq!(catalog.get(ItemTypeId(1)).unwrap().sprite, "belt_yellow");
    }

    #[test]
    fn unknown_item_is_an_error() {
        let catalog = sample();
        assert_eq!(
            catalog.item("copperPlate"),
            Err(CatalogError::UnknownItem("copperPlate".to_string()))
        );
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut builder = ItemCatalogBuilder::new();
        builder.register("ironPlate").unwrap();
        assert_eq!(
            builder.register("ironPlate"),
            Err(CatalogError::DuplicateItem("ironPlate".to_string()))
        );
    }

    #[test]
    fn iter_follows_registration_order() {
        let catalog = sample();
        let names: Vec<_> = catalog.iter().map(|(_, d)| d.name.as_str()).collect();
        assert_eq!(names, vec!["ironPlate", "yellowBelt"]);
        assert_eq!(catalog.len(), 2);
    }
}
