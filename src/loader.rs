//! Entry API: configure once, run many times
//!
//! A [`Loader`] binds an engine and a source path. Every `run`/`execute`
//! call creates a fresh context and a fresh [`LoaderSession`], so repeated
//! or interleaved runs never share module records — a record is bound to
//! one context and reusing it elsewhere would break the engine's identity
//! rules. The optional [`ContentCache`] is the only thing callers may share
//! across runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{ContextConfig, ExportCapture, ScriptEngine};
use crate::error::{LoaderError, LoaderResult};
use crate::fs::{ContentCache, DiskFs, FileReader};
use crate::package::{PackageDirRegistry, PackageRegistry};
use crate::resolver::SpecifierResolver;
use crate::session::LoaderSession;

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Base directory for resolving the entry path and locating installed
    /// packages
    pub base_dir: PathBuf,

    /// Virtual route prefix stripped from every specifier before resolution
    /// (e.g. mount modules under `/module/`)
    pub module_route: Option<String>,

    /// Externally owned source-text cache, shared across runs and loaders
    pub file_cache: Option<ContentCache>,

    /// Context-creation configuration forwarded to the engine
    pub context: ContextConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::current_dir().unwrap_or_default(),
            module_route: None,
            file_cache: None,
            context: ContextConfig::default(),
        }
    }
}

/// Outcome of one `run`/`execute` call.
///
/// Exposes the engine's evaluation result, the finished entry module and
/// the context, so callers can inspect whatever globals the graph left on
/// the sandbox.
pub struct Execution<E: ScriptEngine> {
    pub result: E::Value,
    pub module: Arc<E::Module>,
    pub context: E::Context,
}

impl<E: ScriptEngine> std::fmt::Debug for Execution<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Execution").finish_non_exhaustive()
    }
}

/// Sandboxed module-graph runner for one entry file.
pub struct Loader<E: ScriptEngine> {
    engine: Arc<E>,
    path: PathBuf,
    config: LoaderConfig,
    fs: Arc<dyn FileReader>,
    packages: Arc<dyn PackageRegistry>,
}

impl<E: ScriptEngine> std::fmt::Debug for Loader<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E: ScriptEngine> Loader<E> {
    /// Create a loader with production collaborators: tokio file reads and
    /// package metadata under `<base_dir>/node_modules`.
    pub fn new(
        engine: Arc<E>,
        source_path: impl AsRef<Path>,
        config: LoaderConfig,
    ) -> LoaderResult<Self> {
        let packages = Arc::new(PackageDirRegistry::new(config.base_dir.join("node_modules")));
        Self::with_collaborators(engine, source_path, config, Arc::new(DiskFs), packages)
    }

    /// Create a loader with explicit filesystem and package collaborators.
    pub fn with_collaborators(
        engine: Arc<E>,
        source_path: impl AsRef<Path>,
        config: LoaderConfig,
        fs: Arc<dyn FileReader>,
        packages: Arc<dyn PackageRegistry>,
    ) -> LoaderResult<Self> {
        if !engine.supports_modules() {
            return Err(LoaderError::UnsupportedHost(
                "engine does not provide module-graph primitives".into(),
            ));
        }

        // The entry resolves as if imported from a .js file in base_dir, so
        // extension-less entry paths inherit `.js`.
        let resolver = SpecifierResolver::new(packages.clone(), config.module_route.clone());
        let anchor = config.base_dir.join("main.js");
        let mut path = resolver.resolve(source_path.as_ref().to_string_lossy().as_ref(), &anchor);
        if !path.is_absolute() {
            path = std::env::current_dir().unwrap_or_default().join(path);
        }

        tracing::debug!(path = %path.display(), "loader bound to entry");

        Ok(Self {
            engine,
            path,
            config,
            fs,
            packages,
        })
    }

    /// Resolved absolute path of the entry module.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the entry module inside a fresh context built on `sandbox`.
    ///
    /// The sandbox becomes the context's global object and is mutated in
    /// place by whatever the graph does to it.
    pub async fn run(&self, sandbox: E::Value) -> LoaderResult<Execution<E>> {
        let session = self.session(sandbox)?;
        let module = session.load_path(&self.path).await?;
        let result = self.engine.evaluate(&module).await?;

        Ok(Execution {
            result,
            module,
            context: session.context().clone(),
        })
    }

    /// Run a synthetic adapter that re-exports the entry module's namespace
    /// through `capture`, without the entry needing any export convention.
    pub async fn execute(
        &self,
        sandbox: E::Value,
        capture: ExportCapture<E::Value>,
    ) -> LoaderResult<Execution<E>> {
        let session = self.session(sandbox)?;
        let module = session.load_capture_entry(&self.path, capture).await?;
        let result = self.engine.evaluate(&module).await?;

        Ok(Execution {
            result,
            module,
            context: session.context().clone(),
        })
    }

    /// Sugar over [`execute`](Self::execute): resolve with the entry
    /// module's export namespace.
    pub async fn exports(&self, sandbox: E::Value) -> LoaderResult<E::Value> {
        let captured: Arc<Mutex<Option<E::Value>>> = Arc::new(Mutex::new(None));
        let slot = captured.clone();

        self.execute(
            sandbox,
            Arc::new(move |namespace| {
                *slot.lock() = Some(namespace);
            }),
        )
        .await?;

        captured
            .lock()
            .take()
            .ok_or_else(|| LoaderError::evaluate("entry module never published its namespace"))
    }

    fn session(&self, sandbox: E::Value) -> LoaderResult<LoaderSession<E>> {
        let context = self.engine.create_context(sandbox, &self.config.context)?;
        let resolver =
            SpecifierResolver::new(self.packages.clone(), self.config.module_route.clone());

        Ok(LoaderSession::new(
            self.engine.clone(),
            context,
            resolver,
            self.fs.clone(),
            self.config.file_cache.clone(),
        ))
    }
}
