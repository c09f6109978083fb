//! Per-run load cache and link driver
//!
//! A [`LoaderSession`] lives for exactly one `run`/`execute` call. It owns
//! the execution context and a cache mapping each absolute path to a
//! single-assignment future of the module record compiled for that path.
//!
//! The cache invariant that everything else hangs off: a slot is reserved
//! synchronously on first request and fulfilled with the compiled record
//! *before* that record's own link step starts. Two sibling imports of one
//! path serialize onto the slot (one compile per path per session), and a
//! cyclic graph resolves to the in-flight record instead of recursing.
//! Module records are bound to this session's context and must never leak
//! into another session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use url::Url;

use crate::engine::{ExportCapture, Linker, ModuleHandle, ScriptEngine};
use crate::error::{LoaderError, LoaderResult};
use crate::fs::{ContentCache, FileReader};
use crate::resolver::SpecifierResolver;

type SharedModule<E> =
    Shared<BoxFuture<'static, LoaderResult<Arc<<E as ScriptEngine>::Module>>>>;

pub struct LoaderSession<E: ScriptEngine> {
    engine: Arc<E>,
    context: E::Context,
    resolver: SpecifierResolver,
    fs: Arc<dyn FileReader>,
    contents: Option<ContentCache>,
    cache: Mutex<HashMap<PathBuf, SharedModule<E>>>,
}

impl<E: ScriptEngine> LoaderSession<E> {
    pub(crate) fn new(
        engine: Arc<E>,
        context: E::Context,
        resolver: SpecifierResolver,
        fs: Arc<dyn FileReader>,
        contents: Option<ContentCache>,
    ) -> Self {
        Self {
            engine,
            context,
            resolver,
            fs,
            contents,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn context(&self) -> &E::Context {
        &self.context
    }

    /// Load, compile and link the module at `path`, deduplicated through the
    /// session cache.
    pub(crate) async fn load_path(&self, path: &Path) -> LoaderResult<Arc<E::Module>> {
        // Reserve or join the slot without awaiting in between. The await on
        // a joined slot happens outside this block so the lock guard is not
        // held across an await point.
        let reserved = {
            let mut cache = self.cache.lock();
            if let Some(slot) = cache.get(path) {
                tracing::trace!(path = %path.display(), "module cache hit");
                Err(slot.clone())
            } else {
                let (tx, rx) = oneshot::channel::<LoaderResult<Arc<E::Module>>>();
                let slot: SharedModule<E> = async move {
                    match rx.await {
                        Ok(result) => result,
                        Err(_) => Err(LoaderError::link("module load was abandoned")),
                    }
                }
                .boxed()
                .shared();
                cache.insert(path.to_path_buf(), slot);
                Ok(tx)
            }
        };
        let fulfil = match reserved {
            Ok(tx) => tx,
            Err(slot) => return slot.await,
        };

        let module = match self.compile_module(path).await {
            Ok(module) => module,
            Err(e) => {
                let _ = fulfil.send(Err(e.clone()));
                return Err(e);
            }
        };

        // Fulfil before linking: importers discovered during the recursive
        // link below (including this module itself, in a cycle) receive the
        // record immediately.
        let _ = fulfil.send(Ok(module.clone()));

        self.engine.link(&module, self).await?;

        Ok(module)
    }

    /// Compile the synthetic capture adapter for the entry at `path`.
    ///
    /// The adapter shares the entry's identifier, so its single import
    /// (`./<stem>`) resolves straight back to `path` and the real entry
    /// loads through the cache like any other module. The adapter itself
    /// stays out of the cache.
    pub(crate) async fn load_capture_entry(
        &self,
        path: &Path,
        capture: ExportCapture<E::Value>,
    ) -> LoaderResult<Arc<E::Module>> {
        let identifier = file_identifier(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LoaderError::link(format!("entry has no file name: {}", path.display())))?;
        let specifier = format!("./{stem}");

        let module =
            self.engine
                .compile_capture(&identifier, &specifier, &self.context, capture)?;
        self.engine.link(&module, self).await?;
        Ok(module)
    }

    async fn compile_module(&self, path: &Path) -> LoaderResult<Arc<E::Module>> {
        let source = self.read_source(path).await?;

        // JSON is the one content type the loader adapts; everything else is
        // handed to the engine verbatim.
        let source: Arc<str> = if path.extension().is_some_and(|e| e == "json") {
            format!("export default {source};").into()
        } else {
            source
        };

        let identifier = file_identifier(path)?;
        tracing::debug!(path = %path.display(), identifier = %identifier, "compiling module");
        self.engine.compile(&source, &identifier, &self.context)
    }

    async fn read_source(&self, path: &Path) -> LoaderResult<Arc<str>> {
        if let Some(cache) = &self.contents {
            if let Some(hit) = cache.get(path) {
                tracing::trace!(path = %path.display(), "content cache hit");
                return Ok(hit);
            }
        }

        let text: Arc<str> = self.fs.read(path).await?.into();

        if let Some(cache) = &self.contents {
            cache.insert(path.to_path_buf(), text.clone());
        }

        Ok(text)
    }
}

impl<E: ScriptEngine> Linker<E> for LoaderSession<E> {
    fn link_specifier<'a>(
        &'a self,
        specifier: &'a str,
        referrer: &'a E::Module,
    ) -> BoxFuture<'a, LoaderResult<Arc<E::Module>>> {
        Box::pin(async move {
            let referrer_path = path_from_identifier(referrer.identifier())?;
            let path = self.resolver.resolve(specifier, &referrer_path);
            tracing::trace!(
                specifier = %specifier,
                referrer = %referrer_path.display(),
                path = %path.display(),
                "linking import"
            );
            self.load_path(&path).await
        })
    }
}

/// Canonical `file://` identifier for an absolute path.
pub(crate) fn file_identifier(path: &Path) -> LoaderResult<String> {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .map_err(|_| {
            LoaderError::link(format!(
                "cannot derive a file URL from '{}'",
                path.display()
            ))
        })
}

/// Inverse of [`file_identifier`]: the absolute path behind a module
/// identifier, used to anchor relative imports.
pub(crate) fn path_from_identifier(identifier: &str) -> LoaderResult<PathBuf> {
    let url = Url::parse(identifier)
        .map_err(|e| LoaderError::link(format!("invalid module identifier '{identifier}': {e}")))?;
    url.to_file_path()
        .map_err(|_| LoaderError::link(format!("module identifier is not a file URL: '{identifier}'")))
}
