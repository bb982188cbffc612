//! Entity directory service: resolves dragged identities to entity
//! references. The real terminology store is external; this crate provides
//! the lookup seam plus an in-memory directory seedable from a JSON
//! catalog for local authoring sessions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shared::domain::{EntityKind, EntityRef, Nid, PublicId};
use shared::error::DirectoryError;

/// Lookup seam over the terminology entity store.
///
/// Resolution is the two-step pair the drop flow needs: public identity to
/// nid, then nid to entity reference.
pub trait EntityResolver {
    fn nid_for_identity(&self, public_id: PublicId) -> Result<Nid, DirectoryError>;

    fn entity(&self, nid: Nid) -> Result<EntityRef, DirectoryError>;

    /// Resolves a dragged public identity all the way to an entity
    /// reference. Fails without side effects if either step misses.
    fn resolve_identity(&self, public_id: PublicId) -> Result<EntityRef, DirectoryError> {
        let nid = self.nid_for_identity(public_id)?;
        self.entity(nid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub nid: i64,
    pub public_id: uuid::Uuid,
    pub description: String,
    pub kind: EntityKind,
}

/// In-memory entity directory.
#[derive(Default)]
pub struct EntityDirectory {
    by_identity: HashMap<PublicId, Nid>,
    by_nid: HashMap<Nid, EntityRef>,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a directory from a JSON catalog (an array of entries).
    pub fn from_catalog_json(raw: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(raw)?;
        let mut directory = Self::new();
        for entry in entries {
            directory.insert(EntityRef {
                nid: Nid(entry.nid),
                public_id: PublicId(entry.public_id),
                description: entry.description,
                kind: entry.kind,
            });
        }
        tracing::info!(entities = directory.len(), "loaded entity catalog");
        Ok(directory)
    }

    pub fn insert(&mut self, entity: EntityRef) {
        self.by_identity.insert(entity.public_id, entity.nid);
        self.by_nid.insert(entity.nid, entity);
    }

    pub fn len(&self) -> usize {
        self.by_nid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_nid.is_empty()
    }

    /// All entities, ordered by nid. Used for the palette listing.
    pub fn all(&self) -> Vec<EntityRef> {
        let mut entities: Vec<EntityRef> = self.by_nid.values().cloned().collect();
        entities.sort_by_key(|entity| entity.nid.0);
        entities
    }
}

impl EntityResolver for EntityDirectory {
    fn nid_for_identity(&self, public_id: PublicId) -> Result<Nid, DirectoryError> {
        self.by_identity
            .get(&public_id)
            .copied()
            .ok_or(DirectoryError::UnknownIdentity(public_id))
    }

    fn entity(&self, nid: Nid) -> Result<EntityRef, DirectoryError> {
        self.by_nid
            .get(&nid)
            .cloned()
            .ok_or(DirectoryError::UnknownRef(nid))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
