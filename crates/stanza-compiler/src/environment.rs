//! Compilation environments.
//!
//! An environment names one module tree: an ordered list of directories
//! searched for modules, plus the environment's name itself.

use std::path::PathBuf;

/// A named environment with its module search path.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Environment name (e.g. `production`).
    name: String,
    /// Ordered directories searched for modules.
    modulepath: Vec<PathBuf>,
}

impl Environment {
    /// Create an environment with an empty module path.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modulepath: Vec::new(),
        }
    }

    /// Create an environment with the given module path.
    pub fn with_modulepath(name: impl Into<String>, modulepath: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            modulepath,
        }
    }

    /// Append a directory to the module search path.
    pub fn add_module_path(&mut self, path: impl Into<PathBuf>) {
        self.modulepath.push(path.into());
    }

    /// Environment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered module search path.
    pub fn modulepath(&self) -> &[PathBuf] {
        &self.modulepath
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("production")
    }
}
