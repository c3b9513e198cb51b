// 🏛️ Institution Entity - canonical identity for a cluster of name spellings
//
// "MIT", "M.I.T." and "Massachusetts Inst. of Tech." all resolve to ONE
// CanonicalInstitution. Its id is the stable foreign key every team row uses,
// and its name is the first spelling seen during the run.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CANONICAL INSTITUTION
// ============================================================================

/// One real-world institution, as first encountered in the input
///
/// Never mutated after creation: later spellings that cluster into it do
/// not rename it, and later locations do not overwrite its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalInstitution {
    /// Stable identity for the run - never changes
    pub id: u32,

    /// First-seen spelling, used as the display form
    pub name: String,

    pub city: String,
    pub state: String,
    pub country: String,
}

/// Location attributes copied onto a new institution
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    pub city: &'a str,
    pub state: &'a str,
    pub country: &'a str,
}

// ============================================================================
// INSTITUTION REGISTRY
// ============================================================================

/// Append-only registry of canonical institutions
///
/// Entries keep insertion order, which is also id order. The resolver is
/// the only writer; once the pass finishes the registry is handed out
/// read-only for projection.
#[derive(Debug, Clone)]
pub struct InstitutionRegistry {
    entries: Vec<CanonicalInstitution>,

    /// id → position in `entries`
    index: HashMap<u32, usize>,

    /// Id given to the first entry
    id_base: u32,
}

impl InstitutionRegistry {
    /// Create an empty registry whose first id is 1
    pub fn new() -> Self {
        Self::with_id_base(1)
    }

    /// Create an empty registry with a custom first id
    pub fn with_id_base(id_base: u32) -> Self {
        InstitutionRegistry {
            entries: Vec::new(),
            index: HashMap::new(),
            id_base,
        }
    }

    /// Append a new institution and return its freshly minted id
    ///
    /// Fails with a Config error once the id space above the base is used up.
    pub fn add(&mut self, name: &str, location: Location<'_>) -> Result<u32> {
        let id = self.next_id()?;

        self.index.insert(id, self.entries.len());
        self.entries.push(CanonicalInstitution {
            id,
            name: name.to_string(),
            city: location.city.to_string(),
            state: location.state.to_string(),
            country: location.country.to_string(),
        });

        Ok(id)
    }

    /// Id the next `add` will assign
    pub fn next_id(&self) -> Result<u32> {
        u32::try_from(self.entries.len())
            .ok()
            .and_then(|offset| self.id_base.checked_add(offset))
            .ok_or_else(|| {
                Error::Config(format!(
                    "institution ids exhausted: id base {} cannot hold {} institutions",
                    self.id_base,
                    self.entries.len() + 1
                ))
            })
    }

    /// All institutions in insertion order
    pub fn all(&self) -> &[CanonicalInstitution] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalInstitution> {
        self.entries.iter()
    }

    /// Look up an institution by id
    pub fn get(&self, id: u32) -> Result<&CanonicalInstitution> {
        self.index
            .get(&id)
            .map(|&pos| &self.entries[pos])
            .ok_or(Error::NotFound(id))
    }

    /// Canonical name for an id
    pub fn name_of(&self, id: u32) -> Result<&str> {
        self.get(id).map(|inst| inst.name.as_str())
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InstitutionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
