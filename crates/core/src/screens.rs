//! Lookup structures derived from the secondary-screen set.
//!
//! Both indexes are rebuilt wholesale whenever a new screen set arrives;
//! they are never mutated independently of it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::keyboard::SLEEP_TOGGLE_KEY;
use crate::model::{Item, SecondaryScreen, Section};

/// Normalise a trigger key to a single uppercase character.
///
/// Returns `None` for empty or multi-character values.
pub fn normalize_trigger_key(raw: &str) -> Option<char> {
    let mut chars = raw.trim().chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }

    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => Some(u),
        _ => Some(c),
    }
}

// ---------------------------------------------------------------------------
// TriggerKeyIndex
// ---------------------------------------------------------------------------

/// Two screens registered the same trigger key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyConflict {
    pub key: char,
    /// Screen that lost the key.
    pub replaced_id: String,
    /// Screen that now owns the key.
    pub winner_id: String,
}

/// Keyboard shortcut index keyed by uppercased trigger character.
#[derive(Debug, Clone, Default)]
pub struct TriggerKeyIndex {
    keys: BTreeMap<char, Arc<SecondaryScreen>>,
    conflicts: Vec<KeyConflict>,
}

impl TriggerKeyIndex {
    /// Build the index. On duplicate keys the last screen wins and the
    /// collision is recorded as a configuration warning.
    pub fn build(screens: &[Arc<SecondaryScreen>]) -> Self {
        let mut index = Self::default();

        for screen in screens {
            let Some(key) = normalize_trigger_key(&screen.trigger_key) else {
                if !screen.trigger_key.is_empty() {
                    tracing::warn!(
                        screen_id = %screen.id,
                        trigger_key = %screen.trigger_key,
                        "Ignoring trigger key that is not a single character",
                    );
                }
                continue;
            };

            if key == SLEEP_TOGGLE_KEY {
                tracing::warn!(
                    screen_id = %screen.id,
                    "Trigger key {key} is reserved for sleep mode and will not open this screen",
                );
                continue;
            }

            if let Some(previous) = index.keys.insert(key, Arc::clone(screen)) {
                tracing::warn!(
                    key = %key,
                    replaced = %previous.id,
                    winner = %screen.id,
                    "Duplicate trigger key, last registered screen wins",
                );
                index.conflicts.push(KeyConflict {
                    key,
                    replaced_id: previous.id.clone(),
                    winner_id: screen.id.clone(),
                });
            }
        }

        tracing::debug!(keys = ?index.keys(), "Built trigger key index");
        index
    }

    /// Case-insensitive lookup of a single-character key.
    pub fn lookup(&self, key: &str) -> Option<&Arc<SecondaryScreen>> {
        normalize_trigger_key(key).and_then(|k| self.keys.get(&k))
    }

    /// Registered keys in ascending order.
    pub fn keys(&self) -> Vec<char> {
        self.keys.keys().copied().collect()
    }

    pub fn conflicts(&self) -> &[KeyConflict] {
        &self.conflicts
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ScreenDirectory
// ---------------------------------------------------------------------------

/// Resolves which secondary screen belongs to a section or item.
///
/// A section or item may point at a screen directly, or a screen may
/// point back at it (`linkedItem` / `linkedSectionHeading`). The
/// direct reference wins when both exist.
#[derive(Debug, Clone, Default)]
pub struct ScreenDirectory {
    by_id: HashMap<String, Arc<SecondaryScreen>>,
    by_item_id: HashMap<String, Arc<SecondaryScreen>>,
    by_section_heading: HashMap<String, Arc<SecondaryScreen>>,
}

impl ScreenDirectory {
    pub fn build(screens: &[Arc<SecondaryScreen>]) -> Self {
        let mut directory = Self::default();

        for screen in screens {
            directory
                .by_id
                .insert(screen.id.clone(), Arc::clone(screen));

            if let Some(item) = &screen.linked_item {
                directory
                    .by_item_id
                    .entry(item.id.clone())
                    .or_insert_with(|| Arc::clone(screen));
            }

            if let Some(heading) = screen.linked_section_heading.as_deref() {
                directory
                    .by_section_heading
                    .entry(heading.to_string())
                    .or_insert_with(|| Arc::clone(screen));
            }
        }

        directory
    }

    pub fn get(&self, id: &str) -> Option<&Arc<SecondaryScreen>> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn screen_for_section(&self, section: &Section) -> Option<&Arc<SecondaryScreen>> {
        section
            .linked_secondary_screen
            .as_ref()
            .and_then(|r| self.by_id.get(&r.id))
            .or_else(|| self.by_section_heading.get(&section.heading))
    }

    /// Item groups only resolve through a direct reference.
    pub fn screen_for_item(&self, item: &Item) -> Option<&Arc<SecondaryScreen>> {
        let direct = item
            .linked_secondary_screen()
            .and_then(|r| self.by_id.get(&r.id));

        match item {
            Item::Single(single) => direct.or_else(|| self.by_item_id.get(&single.id)),
            Item::Group(_) => direct,
        }
    }
}
