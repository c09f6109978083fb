//! Vivarium - sandboxed ES-module loader and runner.
//!
//! Given a source path and a sandbox value acting as the global scope, this
//! crate parses the referenced module and everything it statically imports,
//! links the graph and evaluates it inside an isolated execution context.
//! It exists so code written as standard ES modules (browser-oriented
//! scripts poking at `window`, say) can run deterministically inside a test
//! harness, with full control over which globals exist and which files on
//! disk satisfy which import specifiers.
//!
//! # Features
//!
//! - **Specifier resolution**: relative paths with extension inheritance,
//!   absolute paths, bare package names via installed-package metadata,
//!   optional virtual route prefixes
//! - **One compile per file**: a per-run cache guarantees each physical file
//!   is compiled and linked at most once, cycles included
//! - **Isolation**: every run gets a fresh context and cache; nothing leaks
//!   between sandboxes except an explicitly shared [`ContentCache`]
//! - **JSON imports**: `.json` files load as a default export
//! - **Engine-agnostic**: the JavaScript engine is a trait ([`ScriptEngine`])
//!   with pluggable filesystem ([`FileReader`]) and package-metadata
//!   ([`PackageRegistry`]) collaborators
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vivarium::{Loader, LoaderConfig};
//!
//! let loader = Loader::new(engine, "./resources/main", LoaderConfig::default())?;
//!
//! // `sandbox` becomes the global object; the module graph mutates it.
//! let execution = loader.run(sandbox.clone()).await?;
//!
//! // Or capture the entry module's export namespace instead.
//! let namespace = loader.exports(sandbox).await?;
//! ```

pub mod engine;
pub mod error;
pub mod fs;
pub mod loader;
pub mod package;
pub mod resolver;
pub mod session;

pub use engine::{ContextConfig, ExportCapture, Linker, ModuleHandle, ScriptEngine};
pub use error::{ErrorKind, LoaderError, LoaderResult};
pub use fs::{ContentCache, DiskFs, FileReader};
pub use loader::{Execution, Loader, LoaderConfig};
pub use package::{EmptyRegistry, PackageDirRegistry, PackageInfo, PackageRegistry};
pub use resolver::SpecifierResolver;
pub use session::LoaderSession;
