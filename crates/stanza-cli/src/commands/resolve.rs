//! `stanza resolve` — Resolve a type reference against a module tree.

use crate::output::StyledOutput;
use anyhow::bail;
use stanza_compiler::{Environment, TypeKind, TypeLoader, TypeRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use termcolor::ColorChoice;

pub fn execute(
    name: String,
    modulepath: Vec<PathBuf>,
    environment: String,
    definition: bool,
    json: bool,
    color: ColorChoice,
) -> anyhow::Result<()> {
    if modulepath.is_empty() {
        bail!("No module path given (use --modulepath)");
    }

    let env = Environment::with_modulepath(environment, modulepath);
    let registry = Arc::new(TypeRegistry::new());
    let loader = TypeLoader::new(Arc::new(env), registry);

    let kind = if definition {
        TypeKind::Definition
    } else {
        TypeKind::Hostclass
    };

    let Some(def) = loader.find_or_load("", &name, kind)? else {
        bail!("{kind} '{name}' not found on the module path");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&*def)?);
        return Ok(());
    }

    let mut out = StyledOutput::new(color);
    out.bold(&def.name);
    out.plain(&format!(" ({kind})"));
    out.newline();
    out.info(&format!("  defined at {}:{}", def.file.display(), def.line));
    out.newline();
    if let Some(parent) = &def.parent {
        out.plain(&format!("  inherits {parent}"));
        out.newline();
    }
    for param in &def.params {
        match &param.default {
            Some(default) => out.plain(&format!("  ${} = {}", param.name, default)),
            None => out.plain(&format!("  ${} (required)", param.name)),
        }
        out.newline();
    }
    Ok(())
}
