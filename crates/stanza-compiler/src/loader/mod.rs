//! On-demand type loading.
//!
//! The compiler resolves type references lazily: a reference to a class or
//! defined type that is not yet in the registry triggers a search of the
//! module path for the manifest that defines it. [`TypeLoader`] drives that
//! search (candidate expansion, per-key coordination through [`LoadGate`],
//! import, registry re-query) and is safe to share across compiler
//! threads.
//!
//! A loader (with its gate) is scoped to one compilation session. Discard
//! and rebuild it together with the registry for a fresh run.

pub mod candidates;
pub mod gate;

pub use gate::{Entry, LoadGate, TicketGuard};

use crate::environment::Environment;
use crate::error::CompileResult;
use crate::importer::ManifestImporter;
use crate::locator::ManifestLocator;
use crate::registry::TypeRegistry;
use crate::types::{TypeDef, TypeKind};
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolves type references, importing manifests on demand.
pub struct TypeLoader {
    registry: Arc<TypeRegistry>,
    importer: ManifestImporter,
    gate: LoadGate,
}

impl TypeLoader {
    /// Create a loader for one compilation session.
    pub fn new(environment: Arc<Environment>, registry: Arc<TypeRegistry>) -> Self {
        let locator = ManifestLocator::new(environment);
        Self {
            importer: ManifestImporter::new(Arc::clone(&registry), locator),
            registry,
            gate: LoadGate::new(),
        }
    }

    /// The registry this loader resolves against.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Find a class, importing manifests if necessary.
    pub fn find_hostclass(
        &self,
        namespace: &str,
        name: &str,
    ) -> CompileResult<Option<Arc<TypeDef>>> {
        self.find_or_load(namespace, name, TypeKind::Hostclass)
    }

    /// Find a defined type, importing manifests if necessary.
    pub fn find_definition(
        &self,
        namespace: &str,
        name: &str,
    ) -> CompileResult<Option<Arc<TypeDef>>> {
        self.find_or_load(namespace, name, TypeKind::Definition)
    }

    /// Resolve a reference, importing manifests on registry misses.
    ///
    /// Candidates are tried most specific first. For each candidate, its
    /// load targets (module root, then qualified manifest) are imported in
    /// turn, and the registry is re-queried after every import that
    /// succeeds: an import may define the type under a different name than
    /// the candidate itself, and a module-root manifest may or may not
    /// define the types that live in their own files. Exhausting all
    /// candidates is not an error: the reference is simply unknown and
    /// `Ok(None)` is returned.
    pub fn find_or_load(
        &self,
        namespace: &str,
        name: &str,
        kind: TypeKind,
    ) -> CompileResult<Option<Arc<TypeDef>>> {
        if let Some(def) = self.registry.lookup(namespace, name, kind) {
            return Ok(Some(def));
        }

        debug!(namespace, name, %kind, "type not in registry, searching module path");
        for candidate in candidates::name_candidates(namespace, name) {
            for target in candidates::load_targets(&candidate) {
                if self.able_to_load(&target)? {
                    if let Some(def) = self.registry.lookup(namespace, name, kind) {
                        return Ok(Some(def));
                    }
                }
            }
        }

        trace!(namespace, name, "no candidate defined the reference");
        Ok(None)
    }

    /// Try to load one candidate: its module root manifest first, then its
    /// fully qualified manifest. True as soon as either import succeeds.
    pub fn load(&self, candidate: &str) -> CompileResult<bool> {
        for target in candidates::load_targets(candidate) {
            if self.able_to_load(&target)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Import the manifests behind one load key, coordinated through the
    /// gate so concurrent callers of the same key never duplicate the work.
    ///
    /// Returns true when the key's manifests are imported (now or earlier
    /// this session), false when nothing matched the key or the key is
    /// already being loaded further up this thread's call stack.
    fn able_to_load(&self, key: &str) -> CompileResult<bool> {
        match self.gate.enter(key) {
            Entry::Loaded => Ok(true),
            Entry::Reentrant => {
                trace!(key, "load re-entered by its owning thread, deferring");
                Ok(false)
            }
            Entry::Granted(guard) => match self.importer.import(key, None) {
                Ok(imported) => {
                    debug!(key, files = imported, "manifest import succeeded");
                    guard.commit();
                    Ok(true)
                }
                Err(err) if err.is_recoverable() => {
                    trace!(key, "no manifests matched");
                    Ok(false)
                }
                // Fatal: the guard releases the ticket on this path too,
                // before the error unwinds out of the loader
                Err(err) => Err(err.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_module(dir: &TempDir, module: &str, file: &str, contents: &str) -> PathBuf {
        let manifests = dir.path().join(module).join("manifests");
        fs::create_dir_all(&manifests).unwrap();
        let path = manifests.join(file);
        fs::write(&path, contents).unwrap();
        path
    }

    fn loader_for(dir: &TempDir) -> TypeLoader {
        let env = Environment::with_modulepath("production", vec![dir.path().to_path_buf()]);
        TypeLoader::new(Arc::new(env), Arc::new(TypeRegistry::new()))
    }

    #[test]
    fn test_find_hostclass_from_module_root() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "ntp", "init.stz", "class ntp {}");
        let loader = loader_for(&dir);

        let def = loader.find_hostclass("", "ntp").unwrap().unwrap();
        assert_eq!(def.name, "ntp");
        assert_eq!(def.kind, TypeKind::Hostclass);
    }

    #[test]
    fn test_find_definition_from_qualified_manifest() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "apache", "init.stz", "class apache {}");
        write_module(&dir, "apache", "vhost.stz", "define apache::vhost {}");
        let loader = loader_for(&dir);

        let def = loader
            .find_definition("", "apache::vhost")
            .unwrap()
            .unwrap();
        assert_eq!(def.name, "apache::vhost");
    }

    #[test]
    fn test_find_from_enclosing_namespace() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "apache", "init.stz", "class apache {}");
        write_module(&dir, "apache", "params.stz", "class apache::params {}");
        let loader = loader_for(&dir);

        // A reference to `params` from inside `apache` resolves to
        // apache::params via the namespace-qualified candidate
        let def = loader.find_hostclass("apache", "params").unwrap().unwrap();
        assert_eq!(def.name, "apache::params");
    }

    #[test]
    fn test_unknown_reference_is_none_not_error() {
        let dir = TempDir::new().unwrap();
        let loader = loader_for(&dir);

        assert!(loader.find_hostclass("", "nginx").unwrap().is_none());
    }

    #[test]
    fn test_absolute_reference_skips_module_search() {
        let dir = TempDir::new().unwrap();
        // Defining apache::vhost in the apache module root: the absolute
        // reference ::apache::vhost still finds it through the apache
        // module-root target of its single candidate
        write_module(
            &dir,
            "apache",
            "init.stz",
            "class apache {}\ndefine apache::vhost {}",
        );
        let loader = loader_for(&dir);

        let def = loader
            .find_definition("other", "::apache::vhost")
            .unwrap()
            .unwrap();
        assert_eq!(def.name, "apache::vhost");
    }

    #[test]
    fn test_syntax_error_propagates() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "broken", "init.stz", "class broken {");
        let loader = loader_for(&dir);

        let err = loader.find_hostclass("", "broken").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Syntax error"), "got: {message}");

        // The failed key was released and left unloaded: a fixed manifest
        // imports on the next attempt
        fs::write(
            dir.path().join("broken").join("manifests").join("init.stz"),
            "class broken {}",
        )
        .unwrap();
        assert!(loader.find_hostclass("", "broken").unwrap().is_some());
    }

    #[test]
    fn test_reentered_load_defers_to_owning_frame() {
        let dir = TempDir::new().unwrap();
        write_module(&dir, "ntp", "init.stz", "class ntp {}");
        let loader = loader_for(&dir);

        let guard = match loader.gate.enter("ntp") {
            Entry::Granted(guard) => guard,
            _ => panic!("Expected Granted"),
        };

        // Same thread, ticket held higher up the stack: the nested attempt
        // returns false immediately and imports nothing
        assert!(!loader.able_to_load("ntp").unwrap());
        assert!(loader.registry().watched_files().is_empty());

        // The outer frame gives up without committing; a later attempt
        // performs the import normally
        drop(guard);
        assert!(loader.able_to_load("ntp").unwrap());
        assert_eq!(loader.registry().watched_files().len(), 1);
    }

    #[test]
    fn test_second_find_uses_registry_without_import() {
        let dir = TempDir::new().unwrap();
        let path = write_module(&dir, "ntp", "init.stz", "class ntp {}");
        let loader = loader_for(&dir);

        let first = loader.find_hostclass("", "ntp").unwrap().unwrap();

        // Breaking the manifest on disk proves the second call never
        // re-imports: it must come straight from the registry
        fs::write(&path, "class ntp {").unwrap();
        let second = loader.find_hostclass("", "ntp").unwrap().unwrap();
        assert_eq!(first, second);
    }
}
