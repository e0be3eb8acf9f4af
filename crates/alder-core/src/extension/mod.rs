//! Extension resolution engine.
//!
//! An *extension point* is a polymorphic capability identified by a dyn
//! trait type (`dyn Protocol`, `dyn Serialization`, …). Descriptor files map
//! extension *names* to implementation references; implementations register
//! constructors at link time; the per-point [`ExtensionLoader`] resolves a
//! name into a singleton composed through wrapper decoration and dependency
//! injection, or into an *adaptive* stub that picks the concrete
//! implementation per call from URL parameters.
//!
//! # Declaring an extension point
//!
//! ```ignore
//! pub trait Cache: Extension {
//!     fn get(&self, key: &str) -> Option<String>;
//! }
//!
//! impl ExtensionPoint for dyn Cache {
//!     const TYPE_ID: &'static str = "my_crate.Cache";
//!     const TYPE_NAME: &'static str = "Cache";
//!     const DEFAULT: &'static str = "lru";
//! }
//! ```
//!
//! Implementations then ship a provider record plus a descriptor line:
//!
//! ```ignore
//! submit_provider! {
//!     point: dyn Cache,
//!     impl_ref: "my_crate::cache::LruCache",
//!     ordinary: LruCache,
//! }
//! submit_descriptor! {
//!     root: alder_core::constants::ALDER_DIRECTORY,
//!     type_id: "my_crate.Cache",
//!     contents: "lru=my_crate::cache::LruCache\n",
//! }
//! ```

pub mod activate;
pub mod adaptive;
pub mod descriptor;
mod error;
pub mod factory;
mod loader;
pub mod provider;

use std::sync::Arc;

pub use activate::ActivateMeta;
pub use adaptive::AdaptivePlan;
pub use adaptive::Invocation;
pub use error::ExtensionError;
pub use factory::ExtensionFactory;
pub use factory::PointToken;
pub use factory::inject_adaptive;
pub use loader::ExtensionLoader;
pub use loader::ProviderSpec;
pub use provider::Construct;
pub use provider::ErasedExtension;
pub use provider::OrdinaryCtor;
pub use provider::ProviderRecord;

/// Base trait of every extension instance.
///
/// Implementations that depend on other extension points override
/// [`Extension::inject`] and pull the adaptive stub of each dependency from
/// the shared factory (see [`inject_adaptive`]); the default is a no-op for
/// the common dependency-free case. Injection failures are logged by the
/// loader and never abort construction.
pub trait Extension: Send + Sync + 'static {
    /// Resolve this instance's extension dependencies.
    fn inject(&self, factory: &dyn ExtensionFactory) -> Result<(), ExtensionError> {
        let _ = factory;
        Ok(())
    }
}

/// Point-level metadata, implemented on the dyn trait type of an extension
/// point (`impl ExtensionPoint for dyn Cache`).
pub trait ExtensionPoint: Extension {
    /// Unique type identifier. Descriptor files are named after it.
    const TYPE_ID: &'static str;

    /// Short type name, used to infer extension names from implementation
    /// references (`LruCache` for point `Cache` infers `lru`) and to derive
    /// adaptive URL keys (`LoadBalance` derives `load.balance`).
    const TYPE_NAME: &'static str;

    /// Default extension name declaration; empty means no default. A
    /// comma-separated list here is rejected at load time: a point cannot
    /// have two defaults.
    const DEFAULT: &'static str;

    /// Build the adaptive dispatcher for this point.
    ///
    /// Called by [`ExtensionLoader::get_adaptive`] when no author-provided
    /// adaptive implementation is registered. Points with adaptive methods
    /// override this with a stub built on [`AdaptivePlan`]; the default
    /// refuses, which is the "no adaptive method" failure mode.
    fn synthesize_adaptive(
        loader: Arc<ExtensionLoader<Self>>,
    ) -> Result<Arc<Self>, ExtensionError> {
        let _ = loader;
        Err(error::NoAdaptiveMethodSnafu { type_id: Self::TYPE_ID }.build())
    }
}
