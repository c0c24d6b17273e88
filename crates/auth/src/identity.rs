//! Identity resolution seam
//!
//! The permission core never talks to the game engine. Whatever maps a
//! session slot to a stable unique id (SteamID string, account name) is
//! supplied by the host through [`IdentityResolver`].

use std::collections::HashMap;

/// Maps a session slot to the unique id used as the player's store key
pub trait IdentityResolver {
    /// Unique id for `slot`, or `None` if the slot is empty
    fn unique_id(&self, slot: i32) -> Option<String>;
}

impl<F> IdentityResolver for F
where
    F: Fn(i32) -> Option<String>,
{
    fn unique_id(&self, slot: i32) -> Option<String> {
        self(slot)
    }
}

/// Fixed slot-to-id table, for tools and tests without a live server
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    slots: HashMap<i32, String>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `slot` to `unique_id`, replacing any previous binding
    pub fn bind(&mut self, slot: i32, unique_id: impl Into<String>) {
        self.slots.insert(slot, unique_id.into());
    }

    /// Forget `slot` (player disconnected)
    pub fn unbind(&mut self, slot: i32) {
        self.slots.remove(&slot);
    }
}

impl IdentityResolver for SlotTable {
    fn unique_id(&self, slot: i32) -> Option<String> {
        self.slots.get(&slot).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_resolver() {
        let resolver = |slot: i32| (slot == 3).then(|| "STEAM_1:0:3".to_string());
        assert_eq!(resolver.unique_id(3).as_deref(), Some("STEAM_1:0:3"));
        assert!(resolver.unique_id(4).is_none());
    }

    #[test]
    fn test_slot_table() {
        let mut slots = SlotTable::new();
        slots.bind(0, "STEAM_1:0:1");
        assert_eq!(slots.unique_id(0).as_deref(), Some("STEAM_1:0:1"));
        assert!(slots.unique_id(1).is_none());

        slots.unbind(0);
        assert!(slots.unique_id(0).is_none());
    }
}
