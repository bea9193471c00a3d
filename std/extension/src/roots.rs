//! Allow-list of directories the server may read from.
//!
//! Every filesystem access must pass through [`AllowedRoots::authorize`]
//! first. Roots are canonicalized once at construction; candidates are
//! canonicalized the same way and must equal or descend from a root.

use crate::error::ToolError;
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

/// Canonical directory roots, immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoots {
    roots: Vec<PathBuf>,
}

impl AllowedRoots {
    /// Build the allow-list from a comma-separated directory list.
    ///
    /// Entries are trimmed and canonicalized independently; entries that
    /// cannot be canonicalized are skipped with a warning. An empty result
    /// falls back to the current directory.
    pub fn from_list(list: &str) -> io::Result<Self> {
        Self::from_dirs(list.split(',').map(str::trim).filter(|entry| !entry.is_empty()))
    }

    /// Build the allow-list from individual directory paths.
    pub fn from_dirs<I, P>(dirs: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut roots = Vec::new();
        for dir in dirs {
            let dir = dir.as_ref();
            match dir.canonicalize() {
                Ok(canonical) if !roots.contains(&canonical) => roots.push(canonical),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping allowed path {}: {e}", dir.display()),
            }
        }

        if roots.is_empty() {
            let cwd = std::env::current_dir()?.canonicalize()?;
            tracing::warn!(
                "no allowed paths configured, using current directory {}",
                cwd.display()
            );
            roots.push(cwd);
        }

        Ok(Self { roots })
    }

    /// The canonical roots, in configuration order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Roots rendered for display in tool payloads.
    pub fn display_list(&self) -> Vec<String> {
        self.roots.iter().map(|r| r.display().to_string()).collect()
    }

    /// Whether `candidate` equals or descends from one of the roots.
    pub fn is_allowed(&self, candidate: &Path) -> bool {
        resolve(candidate).is_ok_and(|resolved| self.contains(&resolved))
    }

    /// Resolve `candidate` and check it against the roots.
    ///
    /// Returns the canonical path to operate on. Nothing beyond path
    /// resolution touches the filesystem before this check passes.
    pub fn authorize(&self, candidate: &Path) -> Result<PathBuf, ToolError> {
        if candidate.as_os_str().as_encoded_bytes().contains(&0) {
            return Err(ToolError::InvalidValue("path contains null byte".into()));
        }

        let resolved = resolve(candidate)?;
        if !self.contains(&resolved) {
            return Err(ToolError::AccessDenied(candidate.to_path_buf()));
        }
        Ok(resolved)
    }

    fn contains(&self, resolved: &Path) -> bool {
        // `starts_with` compares whole components, so `/data-other` is not
        // inside `/data`.
        self.roots.iter().any(|root| resolved.starts_with(root))
    }
}

/// Symlinks followed while resolving one path before giving up.
const MAX_LINK_HOPS: usize = 40;

/// Canonicalize a path that may not fully exist.
///
/// Components are resolved left to right: every prefix that exists is
/// replaced by its canonical form, `..` drops the last resolved component
/// and missing components are appended as-is. A dangling symlink is
/// replaced by its target, which is resolved in turn, so the result never
/// names a link that could later point elsewhere.
pub fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut pending = owned_components(&absolute);
    let mut resolved = PathBuf::new();
    let mut hops = 0;

    while let Some(next) = pending.pop() {
        match next.components().next() {
            Some(Component::Prefix(_) | Component::RootDir) => resolved.push(&next),
            Some(Component::ParentDir) => {
                resolved.pop();
            }
            Some(Component::Normal(part)) => {
                resolved.push(part);
                if let Ok(canonical) = resolved.canonicalize() {
                    resolved = canonical;
                    continue;
                }
                let is_link = resolved
                    .symlink_metadata()
                    .is_ok_and(|meta| meta.file_type().is_symlink());
                if !is_link {
                    continue;
                }

                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(io::Error::other(format!(
                        "too many levels of symbolic links: {}",
                        path.display()
                    )));
                }
                let target = fs::read_link(&resolved)?;
                resolved.pop();
                if target.is_absolute() {
                    resolved = PathBuf::new();
                }
                pending.extend(owned_components(&target));
            }
            Some(Component::CurDir) | None => {}
        }
    }

    Ok(resolved)
}

/// Components of `path` as a stack, first component on top.
fn owned_components(path: &Path) -> Vec<PathBuf> {
    path.components()
        .rev()
        .map(|c| PathBuf::from(c.as_os_str()))
        .collect()
}
