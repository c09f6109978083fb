//! Import-specifier resolution
//!
//! Turns a raw specifier plus the absolute path of the importing file into
//! an absolute filesystem path. Resolution is pure: the only lookup it
//! performs is package metadata, it never touches the module cache and never
//! checks that the result exists — a wrong guess surfaces later as a
//! not-found read error carrying the guessed path.
//!
//! Strategy order:
//! 1. strip the configured route prefix, if any
//! 2. absolute specifiers pass through unchanged
//! 3. `./` and `../` specifiers join against the referrer's directory,
//!    inheriting the referrer's extension when extension-less
//! 4. anything else is tried as a package name (scoped names span two
//!    segments); a failed lookup falls through to the relative join of
//!    step 3 as a last resort

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::package::PackageRegistry;

/// Session-scoped specifier resolver.
pub struct SpecifierResolver {
    packages: Arc<dyn PackageRegistry>,
    route_prefix: Option<String>,
}

impl SpecifierResolver {
    pub fn new(packages: Arc<dyn PackageRegistry>, route_prefix: Option<String>) -> Self {
        Self {
            packages,
            route_prefix,
        }
    }

    /// Resolve `specifier` as imported from the file at `referrer`.
    pub fn resolve(&self, specifier: &str, referrer: &Path) -> PathBuf {
        let stripped = self.strip_route(specifier);
        let specifier: &str = &stripped;

        if Path::new(specifier).is_absolute() {
            return PathBuf::from(specifier);
        }

        if !is_relative(specifier) {
            if let Some(path) = self.package_path(specifier) {
                tracing::trace!(specifier = %specifier, path = %path.display(), "resolved package specifier");
                return path;
            }
        }

        let dir = referrer.parent().unwrap_or_else(|| Path::new("."));
        let mut file = normalize(&dir.join(specifier));

        if file.extension().is_none() {
            if let Some(ext) = referrer.extension() {
                file.set_extension(ext);
            }
        }

        file
    }

    /// A caller may mount modules under a virtual route; the first occurrence
    /// of that prefix is removed before resolution proper.
    fn strip_route<'a>(&self, specifier: &'a str) -> std::borrow::Cow<'a, str> {
        match &self.route_prefix {
            Some(route) if specifier.contains(route.as_str()) => {
                std::borrow::Cow::Owned(specifier.replacen(route.as_str(), "", 1))
            }
            _ => std::borrow::Cow::Borrowed(specifier),
        }
    }

    /// Resolve a bare specifier through installed-package metadata.
    ///
    /// `None` means "not a package"; the caller falls back to relative
    /// joining, matching how lookup failures are swallowed rather than
    /// raised.
    fn package_path(&self, specifier: &str) -> Option<PathBuf> {
        let mut parts = specifier.split('/');
        let mut name = parts.next()?.to_string();
        if name.is_empty() {
            return None;
        }

        // Scoped packages span two segments: @scope/name
        if name.starts_with('@') {
            name.push('/');
            name.push_str(parts.next()?);
        }

        let info = self.packages.lookup(&name)?;

        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() {
            return Some(info.root.join(&info.entry));
        }

        // A sub-path bypasses the entry file but inherits its extension.
        let mut sub = info.root.join(rest.join("/"));
        if sub.extension().is_none() {
            if let Some(ext) = Path::new(&info.entry).extension() {
                sub.set_extension(ext);
            }
        }
        Some(sub)
    }
}

fn is_relative(specifier: &str) -> bool {
    matches!(specifier.split('/').next(), Some("." | ".."))
}

/// Lexical path normalization: folds `.` and `..` components without
/// touching the filesystem, so equivalent specifiers land on one cache key.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
