//! Manifest import: locate, parse, register.
//!
//! Importing is the side-effecting half of type loading: every declaration
//! in a located manifest is converted to a [`TypeDef`] and registered, and
//! the file joins the session watch list so a later import of the same file
//! (an import cycle, or two load keys resolving to one file) is a no-op.

use crate::locator::{LocateError, ManifestLocator};
use crate::registry::{RegistryError, TypeRegistry};
use crate::types::TypeDef;
use stanza_parser::ParseError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while importing manifests.
#[derive(Debug, Error)]
pub enum ImportError {
    /// No manifest matched the pattern, or the pattern was malformed.
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// Manifest contents failed to parse; fatal, carries file context.
    #[error("Syntax error in {}: {source}", file.display())]
    Syntax {
        /// Manifest file that failed to parse.
        file: PathBuf,
        /// Underlying parse error with line/column context.
        #[source]
        source: ParseError,
    },

    /// Manifest file could not be read.
    #[error("Failed to read manifest {}: {source}", path.display())]
    Io {
        /// Manifest file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Registering a parsed declaration failed; fatal.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ImportError {
    /// Whether the loader may absorb this failure and try its next
    /// candidate. Only "nothing matched" qualifies; everything else
    /// indicates a broken manifest or session and must propagate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ImportError::Locate(LocateError::NotFound(_)))
    }
}

/// Imports manifests, registering the types they declare.
pub struct ManifestImporter {
    registry: Arc<TypeRegistry>,
    locator: ManifestLocator,
}

impl ManifestImporter {
    /// Create an importer writing into `registry`.
    pub fn new(registry: Arc<TypeRegistry>, locator: ManifestLocator) -> Self {
        Self { registry, locator }
    }

    /// The registry this importer writes into.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The locator used to find manifests.
    pub fn locator(&self) -> &ManifestLocator {
        &self.locator
    }

    /// Import every manifest matching `pattern`.
    ///
    /// Files already on the session watch list are skipped. Returns the
    /// number of files newly imported (zero when every match was already
    /// watched, which still counts as success).
    pub fn import(&self, pattern: &str, current_dir: Option<&Path>) -> Result<usize, ImportError> {
        let files = self.locator.resolve(pattern, current_dir)?;
        debug!(pattern, matches = files.len(), "importing manifests");

        let mut imported = 0;
        for file in files {
            if self.import_file(&file)? {
                imported += 1;
            }
        }
        Ok(imported)
    }

    /// Import one manifest file. Returns false when the file was already
    /// watched this session.
    fn import_file(&self, path: &Path) -> Result<bool, ImportError> {
        if self.registry.is_watched(path) {
            trace!(file = %path.display(), "manifest already imported, skipping");
            return Ok(false);
        }

        let source = fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let manifest = stanza_parser::parse(&source).map_err(|source| ImportError::Syntax {
            file: path.to_path_buf(),
            source,
        })?;

        for decl in manifest.decls {
            let def = TypeDef::from_decl(decl, path);
            trace!(kind = %def.kind, name = %def.name, "registering type");
            self.registry.add(def)?;
        }
        self.registry.watch_file(path);
        Ok(true)
    }
}
