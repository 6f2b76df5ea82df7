//! `stanza list` — Inventory every type defined under a module path.

use crate::output::StyledOutput;
use anyhow::bail;
use stanza_compiler::{Environment, ManifestImporter, ManifestLocator, TypeRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use termcolor::ColorChoice;

pub fn execute(modulepath: Vec<PathBuf>, json: bool, color: ColorChoice) -> anyhow::Result<()> {
    if modulepath.is_empty() {
        bail!("No module path given (use --modulepath)");
    }

    let env = Environment::with_modulepath("production", modulepath.clone());
    let registry = Arc::new(TypeRegistry::new());
    let importer = ManifestImporter::new(
        Arc::clone(&registry),
        ManifestLocator::new(Arc::new(env)),
    );

    // Sweep every manifest under every module root
    for root in &modulepath {
        let pattern = root.join("*/manifests/**/*.stz");
        for entry in glob::glob(&pattern.to_string_lossy())? {
            let path = entry?;
            if path.is_file() {
                importer.import(&path.display().to_string(), None)?;
            }
        }
    }

    let mut types = registry.all();
    types.sort_by(|a, b| (a.kind.to_string(), &a.name).cmp(&(b.kind.to_string(), &b.name)));

    if json {
        let defs: Vec<_> = types.iter().map(|def| def.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&defs)?);
        return Ok(());
    }

    let mut out = StyledOutput::new(color);
    for def in &types {
        out.bold(&def.name);
        out.plain(&format!(" ({})", def.kind));
        out.newline();
        out.info(&format!("  {}:{}", def.file.display(), def.line));
        out.newline();
    }
    out.plain(&format!("{} types", types.len()));
    out.newline();
    Ok(())
}
