// 🧷 Intern Table
// Normalized key → sequential identifier, assigned on first sight.
// One table per collection run; nothing here is process-wide.

use crate::normalize::normalize_name;
use std::collections::HashMap;

/// Result of interning a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interned {
    pub id: i64,
    /// True when this call assigned the identifier
    pub is_new: bool,
}

#[derive(Debug, Clone)]
pub struct InternTable {
    ids: HashMap<String, i64>,
    next_id: i64,
}

impl InternTable {
    /// Identifiers start at 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first_id: i64) -> Self {
        InternTable {
            ids: HashMap::new(),
            next_id: first_id,
        }
    }

    /// Look up the identifier for `name`, assigning the next one if unseen
    pub fn intern(&mut self, name: &str) -> Interned {
        let key = normalize_name(name);

        if let Some(&id) = self.ids.get(&key) {
            return Interned { id, is_new: false };
        }

        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(key, id);
        Interned { id, is_new: true }
    }
}

impl Default for InternTable {
    fn default() -> Self {
        Self::new()
    }
}
