//! The player's pack and items lying on the floor

use serde::{Deserialize, Serialize};

use super::{Item, ItemCategory, ItemId};
use crate::geom::Pos;

/// Most distinct stacks the pack holds
pub const MAX_PACK_ITEMS: usize = 26;

/// Ordered inventory; new items go to the end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    items: Vec<Item>,
}

impl Pack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, or hand it back if the pack is full
    pub fn add(&mut self, item: Item) -> Result<ItemId, Item> {
        if self.items.len() >= MAX_PACK_ITEMS {
            return Err(item);
        }
        let id = item.id;
        self.items.push(item);
        Ok(id)
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids of items a thief could take, in pack order
    pub fn unequipped(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|i| !i.is_equipped())
            .map(|i| i.id)
            .collect()
    }

    /// The equipped item of a category, if any
    pub fn equipped(&self, category: ItemCategory) -> Option<&Item> {
        self.items
            .iter()
            .find(|i| i.category == category && i.is_equipped())
    }

    pub fn equipped_mut(&mut self, category: ItemCategory) -> Option<&mut Item> {
        self.items
            .iter_mut()
            .find(|i| i.category == category && i.is_equipped())
    }

    /// Every equipped item of a category (rings come in pairs)
    pub fn equipped_all(&self, category: ItemCategory) -> impl Iterator<Item = &Item> + '_ {
        self.items
            .iter()
            .filter(move |i| i.category == category && i.is_equipped())
    }
}

/// An item lying at a position on the level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorItem {
    pub pos: Pos,
    pub item: Item,
}
