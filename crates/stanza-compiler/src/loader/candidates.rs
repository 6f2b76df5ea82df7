//! Candidate resolution for namespaced type references.
//!
//! A reference like `vhost` seen inside namespace `apache` could be defined
//! as `apache::vhost` or as a top-level `vhost`; and either may live in the
//! module root manifest or in a file named after the type. These pure
//! functions enumerate what to try, most specific first.

use crate::types::{qualified_name, SCOPE_SEPARATOR};

/// Expand a reference into qualified-name candidates, most specific first.
///
/// A leading `::` makes the reference absolute: the single candidate is the
/// name with the marker stripped, and no namespace search happens. Otherwise
/// the candidates are the namespace-qualified name, the owning module root,
/// and the bare name, deduplicated preserving first occurrence.
pub fn name_candidates(namespace: &str, name: &str) -> Vec<String> {
    let namespace = namespace.to_lowercase();
    let name = name.to_lowercase();

    if let Some(absolute) = name.strip_prefix(SCOPE_SEPARATOR) {
        return vec![absolute.to_string()];
    }

    let joined = qualified_name(&namespace, &name);

    let mut candidates = Vec::with_capacity(3);
    push_unique(&mut candidates, joined.clone());
    if let Some((root, _)) = joined.split_once(SCOPE_SEPARATOR) {
        push_unique(&mut candidates, root.to_string());
    }
    push_unique(&mut candidates, name);
    candidates
}

/// Derive the load targets for one candidate, in the order to try them:
/// the module root first, then the fully qualified manifest path.
///
/// `apache::vhost` yields `["apache", "apache/vhost"]`; an unqualified
/// candidate yields just itself.
pub fn load_targets(candidate: &str) -> Vec<String> {
    let root = candidate
        .split(SCOPE_SEPARATOR)
        .next()
        .unwrap_or(candidate)
        .to_string();
    let qualified = candidate.replace(SCOPE_SEPARATOR, "/");

    let mut targets = vec![root];
    if qualified != targets[0] {
        targets.push(qualified);
    }
    targets
}

fn push_unique(candidates: &mut Vec<String>, candidate: String) {
    if !candidates.contains(&candidate) {
        candidates.push(candidate);
    }
}
