//! Flexible content inclusion for static-site templates.
//!
//! An include directive names a file (absolute, `~`-relative or
//! project-relative) or a `!`-prefixed shell command. [`FlexibleInclude`]
//! resolves it, loads the content and returns HTML-ready text:
//!
//! 1. [`directive::Directive`] parses the markup into a filename and typed
//!    [`directive::RenderOptions`]
//! 2. [`ReferenceResolver`] classifies the reference and consults the
//!    [`AccessPolicy`]
//! 3. [`loader`] reads the file or runs the command
//! 4. [`transform`] applies range extraction, escaping, strip, highlight and
//!    numbering
//! 5. [`wrapper`] optionally wraps the result in a labeled `<pre>` block
//!
//! Every failure is routed through [`ErrorPolicy`], which decides between an
//! inline error marker and a fatal [`IncludeError`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use flexinc_config::ErrorConfig;
//! use flexinc_core::{ErrorPolicy, FlexibleInclude, PolicyCell, PolicySettings};
//! use flexinc_core::directive::IncludeContext;
//!
//! static POLICY: PolicyCell = PolicyCell::new();
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("hello.txt"), "<hello>").unwrap();
//!
//! let policy = POLICY.initialize(PolicySettings::default);
//! let include = FlexibleInclude::new(policy, ErrorPolicy::new(ErrorConfig::default()), dir.path());
//! let html = include.render("hello.txt", &IncludeContext::default()).unwrap();
//! assert_eq!(html, "&lt;hello>");
//! ```

pub mod directive;
mod error;
mod expand;
mod include;
pub mod loader;
mod policy;
mod resolver;
pub mod transform;
pub mod wrapper;

pub use error::{ErrorPolicy, Failure, FailureKind, IncludeError, Missing};
pub use expand::{expand_env, expand_home, remove_quotes};
pub use include::FlexibleInclude;
pub use policy::{AccessPolicy, DISABLE_EXECUTION_VAR, INCLUDE_PATHS_VAR, PolicyCell, PolicySettings};
pub use resolver::{ReferenceKind, ReferenceResolver, ResolvedReference};
pub use transform::escape_html;
