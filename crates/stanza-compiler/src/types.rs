//! Compiled type declarations.
//!
//! A [`TypeDef`] is the registry's unit of storage: one class, defined type,
//! or node block, keyed by its fully qualified lower-case name.

use serde::{Deserialize, Serialize};
use stanza_parser::ast::{Block, Decl, NodeMatcher, Param};
use std::fmt;
use std::path::{Path, PathBuf};

/// Namespace separator in qualified names.
pub const SCOPE_SEPARATOR: &str = "::";

/// The kind of a compiled type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// A class declaration.
    Hostclass,
    /// A defined type.
    Definition,
    /// A node block.
    Node,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Hostclass => write!(f, "class"),
            TypeKind::Definition => write!(f, "defined type"),
            TypeKind::Node => write!(f, "node"),
        }
    }
}

/// A compiled type declaration stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Declaration kind.
    pub kind: TypeKind,
    /// Fully qualified lower-case name (no leading `::`).
    pub name: String,
    /// Declared parameters.
    pub params: Vec<Param>,
    /// Parent class named by an `inherits` clause.
    pub parent: Option<String>,
    /// Declaration body.
    pub body: Block,
    /// Manifest file the declaration came from.
    pub file: PathBuf,
    /// Line of the declaration keyword.
    pub line: u32,
}

impl TypeDef {
    /// Convert a parsed declaration into its registry form.
    ///
    /// Names are normalized here: the leading root marker is stripped and
    /// the whole name lower-cased, so registry keys compare by exact value.
    pub fn from_decl(decl: Decl, file: &Path) -> Self {
        match decl {
            Decl::Class(class) => Self {
                kind: TypeKind::Hostclass,
                name: normalize_name(&class.name),
                params: class.params,
                parent: class.parent.as_deref().map(normalize_name),
                body: class.body,
                file: file.to_path_buf(),
                line: class.line,
            },
            Decl::Definition(define) => Self {
                kind: TypeKind::Definition,
                name: normalize_name(&define.name),
                params: define.params,
                parent: None,
                body: define.body,
                file: file.to_path_buf(),
                line: define.line,
            },
            Decl::Node(node) => Self {
                kind: TypeKind::Node,
                name: match &node.matcher {
                    NodeMatcher::Default => "default".to_string(),
                    NodeMatcher::Name(name) => name.to_lowercase(),
                },
                params: Vec::new(),
                parent: None,
                body: node.body,
                file: file.to_path_buf(),
                line: node.line,
            },
        }
    }

    /// The namespace portion of the qualified name (empty for top level).
    pub fn namespace(&self) -> &str {
        match self.name.rfind(SCOPE_SEPARATOR) {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }

    /// The owning module: the first segment of the qualified name.
    pub fn module_name(&self) -> &str {
        self.name
            .split(SCOPE_SEPARATOR)
            .next()
            .unwrap_or(&self.name)
    }
}

/// Join a namespace and a bare name into a qualified name.
///
/// An empty namespace collapses to just the name.
pub fn qualified_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}{SCOPE_SEPARATOR}{name}")
    }
}

/// Normalize a written name to registry form: strip the root marker,
/// lower-case the rest.
pub fn normalize_name(name: &str) -> String {
    name.trim_start_matches(SCOPE_SEPARATOR).to_lowercase()
}
