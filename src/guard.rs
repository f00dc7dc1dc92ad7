//! Path containment checks
//!
//! A path is contained in a root when its canonical form has the canonical
//! root as a component-aligned prefix. `/media/foo` is not inside
//! `/media/fo`. Anything that fails to canonicalize is rejected.

use std::path::{Component, Path, PathBuf};

/// Canonicalize a list of roots, dropping the ones that do not resolve
pub fn canonical_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .filter_map(|root| match root.canonicalize() {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Cannot canonicalize root {:?}: {}", root, e);
                None
            }
        })
        .collect()
}

/// Check whether `candidate` lies inside one of `roots`.
///
/// Relative candidates are tried against each root in order. Returns the
/// canonical path on success.
pub fn is_contained(candidate: &Path, roots: &[PathBuf]) -> Option<PathBuf> {
    if candidate.as_os_str().is_empty() {
        return None;
    }
    if candidate.is_absolute() {
        let canonical = candidate.canonicalize().ok()?;
        return roots
            .iter()
            .any(|root| within_root(&canonical, root))
            .then_some(canonical);
    }
    roots
        .iter()
        .find_map(|root| contained_in_root(candidate, root))
}

/// Check a relative `candidate` against a single root
pub fn contained_in_root(candidate: &Path, root: &Path) -> Option<PathBuf> {
    let canonical = root.join(candidate).canonicalize().ok()?;
    within_root(&canonical, root).then_some(canonical)
}

/// Whether an already canonical path lies under `root`. The root is
/// canonicalized unless it already is absolute and free of `.`/`..`.
pub fn within_root(canonical: &Path, root: &Path) -> bool {
    if is_normalized(root) && canonical.starts_with(root) {
        return true;
    }
    match root.canonicalize() {
        Ok(root) => canonical.starts_with(&root),
        Err(_) => false,
    }
}

/// Index of the first root containing `canonical`
pub fn owning_root(canonical: &Path, canonical_roots: &[PathBuf]) -> Option<usize> {
    canonical_roots
        .iter()
        .position(|root| canonical.starts_with(root))
}

/// `canonical` relative to `root`, `/`-separated. `None` when not under the
/// root or when a component is not valid UTF-8.
pub fn relative_to(canonical: &Path, root: &Path) -> Option<String> {
    let rest = canonical.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rest.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

fn is_normalized(path: &Path) -> bool {
    path.is_absolute()
        && path
            .components()
            .all(|c| !matches!(c, Component::CurDir | Component::ParentDir))
}
