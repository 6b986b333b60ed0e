//! Cached struct-to-struct field mapping.
//!
//! Struct copies match fields by name. The name resolution only depends on the
//! field names of the two shapes, so it is computed once per pair of shapes and
//! shared. Keys use shape hashes: two distinct types may carry the same name.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;
use valuecast_core::{TypeDescriptor, TypeHash};

/// For each target field, the index of the source field with the same name.
pub type FieldMap = Arc<[Option<usize>]>;

#[derive(Debug, Default)]
pub struct FieldIndexCache {
    maps: RwLock<FxHashMap<(TypeHash, TypeHash), FieldMap>>,
}

impl FieldIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the field mapping from `source` to `target`.
    pub fn resolve(&self, source: &TypeDescriptor, target: &TypeDescriptor) -> FieldMap {
        let key = (source.shape_hash(), target.shape_hash());
        {
            let maps = self.maps.read().unwrap_or_else(|e| e.into_inner());
            if let Some(map) = maps.get(&key) {
                return Arc::clone(map);
            }
        }

        let map = build(source, target);
        let mut maps = self.maps.write().unwrap_or_else(|e| e.into_inner());
        maps.insert(key, Arc::clone(&map));
        map
    }

    pub fn len(&self) -> usize {
        self.maps.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.maps.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

fn build(source: &TypeDescriptor, target: &TypeDescriptor) -> FieldMap {
    target
        .fields()
        .iter()
        .map(|f| source.field_index(f.name()))
        .collect()
}
