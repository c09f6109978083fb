//! Execution-engine seam
//!
//! The loader never parses or evaluates JavaScript itself. It drives a host
//! engine through this trait using exactly four operations: context creation,
//! `compile`, `link` and `evaluate`. Linking is callback-driven: the engine
//! calls [`Linker::link_specifier`] once per static import it discovers, and
//! the loader answers with the module record for that specifier.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::LoaderResult;

/// Configuration forwarded verbatim to context creation.
///
/// `name` and `origin` are the conventional keys; anything else the caller
/// wants the engine to see goes into `extras` untouched.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Human-readable context name, shown in engine diagnostics
    pub name: String,

    /// Origin the context reports to scripts, if any
    pub origin: Option<String>,

    /// Open extension map passed through to the engine
    pub extras: HashMap<String, serde_json::Value>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            name: format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            origin: None,
            extras: HashMap::new(),
        }
    }
}

/// Callback invoked with an entry module's namespace once it has evaluated.
///
/// Used by the capture compile mode; see [`ScriptEngine::compile_capture`].
pub type ExportCapture<V> = Arc<dyn Fn(V) + Send + Sync>;

/// A compiled module as seen by the loader.
///
/// The identifier is the canonical `file://` URL the loader handed to
/// `compile`; the linker derives the referencing path from it.
pub trait ModuleHandle: Send + Sync {
    fn identifier(&self) -> &str;
}

/// Resolves an import specifier to a module record on behalf of the engine.
///
/// Implemented by the loader's session. The returned record may still be
/// linking when it comes back — that is how import cycles resolve to the
/// in-flight record instead of recursing forever — and the engine is
/// expected to tolerate it, as host module machineries do.
pub trait Linker<E: ScriptEngine>: Send + Sync {
    fn link_specifier<'a>(
        &'a self,
        specifier: &'a str,
        referrer: &'a E::Module,
    ) -> BoxFuture<'a, LoaderResult<Arc<E::Module>>>;
}

/// The host JavaScript engine.
///
/// `compile` and `create_context` are synchronous; `link` and `evaluate` are
/// the only engine operations the loader suspends on.
pub trait ScriptEngine: Sized + Send + Sync + 'static {
    /// Isolated global-scope environment. Cheap to clone (a handle).
    type Context: Clone + Send + Sync;

    /// Engine module object.
    type Module: ModuleHandle + Send + Sync + 'static;

    /// Engine value: the sandbox, evaluation outcomes and namespaces.
    type Value: Clone + Send + Sync;

    /// Whether the engine provides module-graph primitives at all.
    ///
    /// Checked once at loader construction so a missing capability fails
    /// fast instead of at first link.
    fn supports_modules(&self) -> bool {
        true
    }

    /// Create an isolated context whose global scope is overlaid on `sandbox`.
    fn create_context(
        &self,
        sandbox: Self::Value,
        config: &ContextConfig,
    ) -> LoaderResult<Self::Context>;

    /// Compile `source` into a module bound to `context`.
    fn compile(
        &self,
        source: &str,
        identifier: &str,
        context: &Self::Context,
    ) -> LoaderResult<Arc<Self::Module>>;

    /// Compile a synthetic re-export adapter around `entry_specifier`.
    ///
    /// The adapter's single static import is `entry_specifier`; evaluating it
    /// passes the entry module's namespace to `capture`. This is the capture
    /// compile mode backing [`Loader::execute`](crate::Loader::execute) — the
    /// loader never templates source text to get at a namespace.
    fn compile_capture(
        &self,
        identifier: &str,
        entry_specifier: &str,
        context: &Self::Context,
        capture: ExportCapture<Self::Value>,
    ) -> LoaderResult<Arc<Self::Module>>;

    /// Link `module`: the engine calls `linker` once per static import.
    fn link<'a>(
        &'a self,
        module: &'a Arc<Self::Module>,
        linker: &'a dyn Linker<Self>,
    ) -> BoxFuture<'a, LoaderResult<()>>;

    /// Evaluate a linked module graph rooted at `module`.
    ///
    /// Every module in the graph evaluates at most once, dependencies before
    /// dependents.
    fn evaluate<'a>(
        &'a self,
        module: &'a Arc<Self::Module>,
    ) -> BoxFuture<'a, LoaderResult<Self::Value>>;
}
