//! Core building blocks for the alder RPC framework.
//!
//! This crate owns the two pieces every other alder crate builds on:
//!
//! - [`Url`]: the immutable, per-call parameter bag that drives extension
//!   selection and codec configuration.
//! - [`extension`]: the extension resolution engine: descriptor files name
//!   implementations of extension points, the per-point
//!   [`ExtensionLoader`](extension::ExtensionLoader) composes them through
//!   wrapper decoration and dependency injection, and adaptive stubs pick a
//!   concrete implementation per call from URL parameters.
//!
//! Extension implementations register themselves at link time via
//! [`submit_provider!`] and ship their descriptor entries via
//! [`submit_descriptor!`], so pulling a crate into the build is all it takes
//! to make its extensions resolvable.

pub mod constants;
pub mod extension;
pub mod url;

// Re-exported for the registration macros; downstream crates do not need
// their own `inventory` dependency to submit providers.
pub use inventory;

pub use extension::Extension;
pub use extension::ExtensionError;
pub use extension::ExtensionFactory;
pub use extension::ExtensionLoader;
pub use extension::ExtensionPoint;
pub use extension::Invocation;
pub use url::Url;
pub use url::UrlError;
