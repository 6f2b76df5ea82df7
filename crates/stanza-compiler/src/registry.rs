//! Shared registry of compiled type declarations.
//!
//! One registry exists per compilation session. Any thread may read it at
//! any time; writes happen from whichever thread owns the in-flight import
//! of a given manifest. A `parking_lot::RwLock` over the type map provides
//! the concurrent-reads-single-writer guarantee the loader relies on.

use crate::types::{qualified_name, TypeDef, TypeKind, SCOPE_SEPARATOR};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by registry writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A declaration with the same kind and qualified name already exists.
    #[error("{kind} '{name}' is already defined")]
    DuplicateType {
        /// Kind of the conflicting declaration.
        kind: TypeKind,
        /// Fully qualified name of the conflicting declaration.
        name: String,
    },
}

/// Thread-safe registry of type declarations and imported manifests.
pub struct TypeRegistry {
    /// Declarations keyed by kind and fully qualified lower-case name.
    types: RwLock<FxHashMap<(TypeKind, String), Arc<TypeDef>>>,
    /// Manifest files imported during this session (the re-import guard).
    watched: RwLock<FxHashSet<PathBuf>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            types: RwLock::new(FxHashMap::default()),
            watched: RwLock::new(FxHashSet::default()),
        }
    }

    /// Register a declaration.
    ///
    /// # Returns
    /// * `Ok(Arc<TypeDef>)` - The stored declaration
    /// * `Err(RegistryError)` - A declaration with this key already exists
    pub fn add(&self, def: TypeDef) -> Result<Arc<TypeDef>, RegistryError> {
        let def = Arc::new(def);
        let mut types = self.types.write();
        match types.entry((def.kind, def.name.clone())) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateType {
                kind: def.kind,
                name: def.name.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&def));
                Ok(def)
            }
        }
    }

    /// Fetch a declaration by its exact qualified name.
    pub fn get(&self, name: &str, kind: TypeKind) -> Option<Arc<TypeDef>> {
        self.types.read().get(&(kind, name.to_string())).cloned()
    }

    /// Resolve a written reference against a namespace.
    ///
    /// Inputs are lower-cased first. An absolute reference (leading `::`)
    /// is looked up exactly; anything else tries the namespace-qualified
    /// name, then the bare name at top level.
    pub fn lookup(&self, namespace: &str, name: &str, kind: TypeKind) -> Option<Arc<TypeDef>> {
        let namespace = namespace.to_lowercase();
        let name = name.to_lowercase();

        if let Some(absolute) = name.strip_prefix(SCOPE_SEPARATOR) {
            return self.get(absolute, kind);
        }
        if !namespace.is_empty() {
            if let Some(def) = self.get(&qualified_name(&namespace, &name), kind) {
                return Some(def);
            }
        }
        self.get(&name, kind)
    }

    /// Record that a manifest file has been imported this session.
    pub fn watch_file(&self, path: &Path) {
        self.watched.write().insert(path.to_path_buf());
    }

    /// Whether a manifest file has already been imported this session.
    pub fn is_watched(&self, path: &Path) -> bool {
        self.watched.read().contains(path)
    }

    /// Sorted list of manifests imported this session.
    pub fn watched_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.watched.read().iter().cloned().collect();
        files.sort();
        files
    }

    /// Session version: a digest over the imported-manifest list.
    ///
    /// The version changes exactly when a new manifest joins the session,
    /// which is what cache invalidation downstream keys on.
    pub fn version(&self) -> String {
        let mut hasher = Sha256::new();
        for path in self.watched_files() {
            hasher.update(path.to_string_lossy().as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// All registered declarations, unordered.
    pub fn all(&self) -> Vec<Arc<TypeDef>> {
        self.types.read().values().cloned().collect()
    }

    /// Number of registered declarations.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether the registry holds no declarations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all declarations and the watch list (session reset).
    pub fn reset(&self) {
        self.types.write().clear();
        self.watched.write().clear();
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_parser::ast::Block;

    fn class_def(name: &str) -> TypeDef {
        TypeDef {
            kind: TypeKind::Hostclass,
            name: name.to_string(),
            params: Vec::new(),
            parent: None,
            body: Block::empty(),
            file: PathBuf::from("/modules/test/manifests/init.stz"),
            line: 1,
        }
    }

    #[test]
    fn test_add_and_get() {
        let registry = TypeRegistry::new();
        registry.add(class_def("apache")).unwrap();

        assert!(registry.get("apache", TypeKind::Hostclass).is_some());
        assert!(registry.get("apache", TypeKind::Definition).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_add_fails() {
        let registry = TypeRegistry::new();
        registry.add(class_def("apache")).unwrap();

        let err = registry.add(class_def("apache")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateType {
                kind: TypeKind::Hostclass,
                name: "apache".to_string(),
            }
        );
    }

    #[test]
    fn test_same_name_different_kind_coexist() {
        let registry = TypeRegistry::new();
        registry.add(class_def("apache")).unwrap();

        let mut def = class_def("apache");
        def.kind = TypeKind::Definition;
        registry.add(def).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_prefers_namespace_qualified() {
        let registry = TypeRegistry::new();
        registry.add(class_def("params")).unwrap();
        registry.add(class_def("apache::params")).unwrap();

        let found = registry
            .lookup("apache", "params", TypeKind::Hostclass)
            .unwrap();
        assert_eq!(found.name, "apache::params");

        let found = registry.lookup("", "params", TypeKind::Hostclass).unwrap();
        assert_eq!(found.name, "params");
    }

    #[test]
    fn test_lookup_falls_back_to_top_level() {
        let registry = TypeRegistry::new();
        registry.add(class_def("ntp")).unwrap();

        let found = registry.lookup("apache", "ntp", TypeKind::Hostclass);
        assert!(found.is_some());
    }

    #[test]
    fn test_lookup_absolute_bypasses_namespace() {
        let registry = TypeRegistry::new();
        registry.add(class_def("params")).unwrap();
        registry.add(class_def("apache::params")).unwrap();

        let found = registry
            .lookup("apache", "::params", TypeKind::Hostclass)
            .unwrap();
        assert_eq!(found.name, "params");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = TypeRegistry::new();
        registry.add(class_def("apache::params")).unwrap();

        assert!(registry
            .lookup("Apache", "Params", TypeKind::Hostclass)
            .is_some());
    }

    #[test]
    fn test_watch_list_and_version() {
        let registry = TypeRegistry::new();
        let before = registry.version();

        registry.watch_file(Path::new("/m/a/manifests/init.stz"));
        assert!(registry.is_watched(Path::new("/m/a/manifests/init.stz")));
        assert!(!registry.is_watched(Path::new("/m/b/manifests/init.stz")));

        let after = registry.version();
        assert_ne!(before, after);

        // Re-watching the same file leaves the version unchanged
        registry.watch_file(Path::new("/m/a/manifests/init.stz"));
        assert_eq!(after, registry.version());
    }

    #[test]
    fn test_reset_clears_everything() {
        let registry = TypeRegistry::new();
        registry.add(class_def("apache")).unwrap();
        registry.watch_file(Path::new("/m/a/manifests/init.stz"));

        registry.reset();
        assert!(registry.is_empty());
        assert!(!registry.is_watched(Path::new("/m/a/manifests/init.stz")));
    }
}
