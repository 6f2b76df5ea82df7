//! `stanza check` — Parse manifests and report syntax errors.

use crate::output::StyledOutput;
use anyhow::{bail, Context};
use std::fs;
use std::path::PathBuf;
use termcolor::ColorChoice;

pub fn execute(files: Vec<String>, color: ColorChoice) -> anyhow::Result<()> {
    if files.is_empty() {
        bail!("No manifest files given");
    }

    let mut out = StyledOutput::new(color);
    let mut checked = 0usize;
    let mut failed = 0usize;

    for path in expand(&files)? {
        checked += 1;
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match stanza_parser::parse(&source) {
            Ok(manifest) => {
                out.success("ok");
                out.plain(&format!(
                    "    {} ({} declarations)",
                    path.display(),
                    manifest.decls.len()
                ));
                out.newline();
            }
            Err(err) => {
                failed += 1;
                stanza_parser::diagnostics::emit(&path.display().to_string(), &source, &err);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {checked} manifests failed to parse");
    }
    out.bold(&format!("{checked} manifests parsed cleanly"));
    out.newline();
    Ok(())
}

/// Expand glob patterns; plain paths pass through untouched.
fn expand(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            let matches = glob::glob(pattern)
                .with_context(|| format!("Invalid glob pattern '{pattern}'"))?;
            for entry in matches {
                let path = entry?;
                if path.is_file() {
                    paths.push(path);
                }
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    if paths.is_empty() {
        bail!("No manifests matched");
    }
    paths.sort();
    Ok(paths)
}
