//! Manifest location on the module path.
//!
//! Resolves a load pattern to the manifest files it names. Three pattern
//! shapes are supported:
//! - Module references: `apache` (the module root, `manifests/init.stz`)
//!   and `apache/vhost` (`manifests/vhost.stz` inside the module)
//! - Paths relative to the importing manifest: `./site.stz`, `shared/base`
//! - Glob patterns: `services/*/manifests/*.stz`

use crate::environment::Environment;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// File extension of Stanza manifests.
pub const MANIFEST_EXTENSION: &str = "stz";

/// Errors raised while locating manifests.
#[derive(Debug, Error)]
pub enum LocateError {
    /// Nothing on disk matched the pattern; recoverable upstream.
    #[error("No manifests found for '{0}'")]
    NotFound(String),

    /// The pattern is not a valid glob.
    #[error("Invalid manifest pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: glob::PatternError,
    },
}

/// Locates manifest files for load patterns.
#[derive(Debug, Clone)]
pub struct ManifestLocator {
    environment: Arc<Environment>,
}

impl ManifestLocator {
    /// Create a locator searching the environment's module path.
    pub fn new(environment: Arc<Environment>) -> Self {
        Self { environment }
    }

    /// The environment this locator searches.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Resolve a pattern to manifest files.
    ///
    /// # Arguments
    /// * `pattern` - Load pattern (module reference, relative path, or glob)
    /// * `current_dir` - Directory of the importing manifest, if any
    ///
    /// # Returns
    /// * `Ok(Vec<PathBuf>)` - Matching files, never empty
    /// * `Err(LocateError::NotFound)` - Nothing matched
    pub fn resolve(
        &self,
        pattern: &str,
        current_dir: Option<&Path>,
    ) -> Result<Vec<PathBuf>, LocateError> {
        let found = if is_glob(pattern) {
            self.resolve_glob(pattern, current_dir)?
        } else {
            self.resolve_name(pattern, current_dir)
        };

        if found.is_empty() {
            Err(LocateError::NotFound(pattern.to_string()))
        } else {
            Ok(found)
        }
    }

    /// Expand a glob pattern, sorted for deterministic import order.
    fn resolve_glob(
        &self,
        pattern: &str,
        current_dir: Option<&Path>,
    ) -> Result<Vec<PathBuf>, LocateError> {
        let full = match current_dir {
            Some(dir) if !Path::new(pattern).is_absolute() => dir.join(pattern),
            _ => PathBuf::from(pattern),
        };

        let paths = glob::glob(&full.to_string_lossy()).map_err(|source| LocateError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut matches: Vec<PathBuf> = paths
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .collect();
        matches.sort();
        Ok(matches)
    }

    /// Resolve a non-glob reference: absolute path, path relative to the
    /// importing manifest, then module-qualified search.
    fn resolve_name(&self, pattern: &str, current_dir: Option<&Path>) -> Vec<PathBuf> {
        let file = with_extension(pattern);

        let path = Path::new(&file);
        if path.is_absolute() {
            return if path.is_file() {
                vec![path.to_path_buf()]
            } else {
                Vec::new()
            };
        }

        if let Some(dir) = current_dir {
            let local = dir.join(&file);
            if local.is_file() {
                return vec![local];
            }
        }

        // `module` names the module root manifest; `module/rest` a file
        // inside the module's manifests directory. First module-path hit
        // wins, matching the search-path order.
        let (module, rest) = match pattern.split_once('/') {
            Some((module, rest)) => (module, Some(rest)),
            None => (pattern, None),
        };

        for root in self.environment.modulepath() {
            let candidate = match rest {
                Some(rest) => root.join(module).join("manifests").join(with_extension(rest)),
                None => root
                    .join(module)
                    .join("manifests")
                    .join(with_extension("init")),
            };
            if candidate.is_file() {
                return vec![candidate];
            }
        }

        Vec::new()
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn with_extension(name: &str) -> String {
    let suffix = format!(".{MANIFEST_EXTENSION}");
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Build a module tree: `<root>/<module>/manifests/<file>` per entry.
    fn module_tree(entries: &[(&str, &str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (module, file, contents) in entries {
            let manifests = dir.path().join(module).join("manifests");
            fs::create_dir_all(&manifests).unwrap();
            fs::write(manifests.join(file), contents).unwrap();
        }
        dir
    }

    fn locator_for(dir: &TempDir) -> ManifestLocator {
        let env = Environment::with_modulepath("production", vec![dir.path().to_path_buf()]);
        ManifestLocator::new(Arc::new(env))
    }

    #[test]
    fn test_resolve_module_root() {
        let dir = module_tree(&[("apache", "init.stz", "class apache {}")]);
        let locator = locator_for(&dir);

        let files = locator.resolve("apache", None).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("apache/manifests/init.stz"));
    }

    #[test]
    fn test_resolve_qualified_file() {
        let dir = module_tree(&[
            ("apache", "init.stz", "class apache {}"),
            ("apache", "vhost.stz", "define apache::vhost {}"),
        ]);
        let locator = locator_for(&dir);

        let files = locator.resolve("apache/vhost", None).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("apache/manifests/vhost.stz"));
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let dir = module_tree(&[("apache", "init.stz", "class apache {}")]);
        let locator = locator_for(&dir);

        match locator.resolve("nginx", None) {
            Err(LocateError::NotFound(pattern)) => assert_eq!(pattern, "nginx"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_relative_to_current_dir() {
        let dir = module_tree(&[("site", "base.stz", "class base {}")]);
        let locator = locator_for(&dir);
        let current = dir.path().join("site").join("manifests");

        let files = locator.resolve("base", Some(&current)).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("site/manifests/base.stz"));
    }

    #[test]
    fn test_resolve_modulepath_order_wins() {
        let first = module_tree(&[("apache", "init.stz", "class apache {}")]);
        let second = module_tree(&[("apache", "init.stz", "class apache {}")]);
        let env = Environment::with_modulepath(
            "production",
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        );
        let locator = ManifestLocator::new(Arc::new(env));

        let files = locator.resolve("apache", None).unwrap();
        assert!(files[0].starts_with(first.path()));
    }

    #[test]
    fn test_resolve_glob_is_sorted() {
        let dir = module_tree(&[
            ("apache", "b.stz", "class apache::b {}"),
            ("apache", "a.stz", "class apache::a {}"),
        ]);
        let locator = locator_for(&dir);

        let pattern = format!("{}/apache/manifests/*.stz", dir.path().display());
        let files = locator.resolve(&pattern, None).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.stz"));
        assert!(files[1].ends_with("b.stz"));
    }

    #[test]
    fn test_extension_not_doubled() {
        let dir = module_tree(&[("apache", "init.stz", "class apache {}")]);
        let locator = locator_for(&dir);
        let current = dir.path().join("apache").join("manifests");

        let files = locator.resolve("init.stz", Some(&current)).unwrap();
        assert_eq!(files.len(), 1);
    }
}
