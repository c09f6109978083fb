//! Installed-package metadata lookup
//!
//! Bare import specifiers resolve against package metadata: a package name
//! maps to its installed directory and a preferred ESM entry file. This is
//! deliberately not a full resolution algorithm — no conditional exports, no
//! directory walking — just the declared `module`/`jsnext:main` field with an
//! `index.js` default.

use std::path::PathBuf;

use serde::Deserialize;

/// Where a package lives and which file is its entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Installed package root directory
    pub root: PathBuf,
    /// Entry file, relative to `root`
    pub entry: String,
}

/// Given a package name, return its installed location and entry point.
///
/// `None` means "not a package" — the resolver swallows it and falls back to
/// relative joining.
pub trait PackageRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> Option<PackageInfo>;
}

/// The subset of `package.json` the loader cares about.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    module: Option<String>,
    #[serde(rename = "jsnext:main")]
    jsnext_main: Option<String>,
}

impl PackageManifest {
    fn entry(&self) -> String {
        self.module
            .clone()
            .or_else(|| self.jsnext_main.clone())
            .unwrap_or_else(|| "index.js".to_string())
    }
}

/// Registry over a single installed-packages directory.
///
/// Looks for `<dir>/<name>/package.json`; scoped names (`@scope/pkg`) map to
/// nested directories.
#[derive(Debug, Clone)]
pub struct PackageDirRegistry {
    packages_dir: PathBuf,
}

impl PackageDirRegistry {
    pub fn new(packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            packages_dir: packages_dir.into(),
        }
    }
}

impl PackageRegistry for PackageDirRegistry {
    fn lookup(&self, name: &str) -> Option<PackageInfo> {
        let root = self.packages_dir.join(name);
        let manifest_path = root.join("package.json");

        let content = std::fs::read_to_string(&manifest_path).ok()?;
        let manifest: PackageManifest = serde_json::from_str(&content).ok()?;

        Some(PackageInfo {
            root,
            entry: manifest.entry(),
        })
    }
}

/// Registry that knows no packages. Every bare specifier falls through to
/// relative resolution.
#[derive(Debug, Clone, Default)]
pub struct EmptyRegistry;

impl PackageRegistry for EmptyRegistry {
    fn lookup(&self, _name: &str) -> Option<PackageInfo> {
        None
    }
}
