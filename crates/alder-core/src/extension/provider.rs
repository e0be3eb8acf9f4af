//! Link-time provider table.
//!
//! Descriptor files name implementations by *reference string*; this module
//! is where those references resolve. Every implementation crate submits a
//! [`ProviderRecord`] through [`submit_provider!`], collected with the
//! `inventory` crate, so the full provider table is assembled at link time
//! without a central registry file.
//!
//! A record's role is fixed by which constructor variant it supplies:
//! ordinary implementations construct from nothing, wrappers construct
//! around an existing instance of the same point, and adaptive records are
//! author-provided dispatchers.

use std::any::Any;
use std::sync::Arc;

use super::activate::ActivateMeta;
use super::ExtensionPoint;

/// A type-erased extension instance: an `Arc<P>` for some extension point
/// `P`, transportable through the non-generic provider table.
#[derive(Clone)]
pub struct ErasedExtension(Arc<dyn Any + Send + Sync>);

impl ErasedExtension {
    /// Erase a typed instance.
    pub fn new<P: ExtensionPoint + ?Sized>(instance: Arc<P>) -> Self {
        Self(Arc::new(instance))
    }

    /// Recover the typed instance. `None` when the erased value belongs to a
    /// different extension point.
    pub fn downcast<P: ExtensionPoint + ?Sized>(&self) -> Option<Arc<P>> {
        self.0.downcast_ref::<Arc<P>>().cloned()
    }
}

impl std::fmt::Debug for ErasedExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ErasedExtension")
    }
}

/// Constructor producing the concrete (pre-cast) instance of an ordinary
/// implementation.
pub type ConcreteFn = fn() -> Arc<dyn Any + Send + Sync>;

/// Cast of a cached concrete instance into one extension point's view.
pub type CastFn = fn(Arc<dyn Any + Send + Sync>) -> Option<ErasedExtension>;

/// Constructor for a wrapper: receives the current composition and returns
/// the decorated instance, or `None` when the inner value is not of the
/// wrapper's point.
pub type WrapperFn = fn(&ErasedExtension) -> Option<ErasedExtension>;

/// Constructor for an author-provided adaptive implementation.
pub type AdaptiveFn = fn() -> ErasedExtension;

/// Ordinary-role constructor pair. The concrete instance is cached by
/// implementation reference and shared by every extension point the type
/// serves; `cast` produces this point's view of it.
#[derive(Clone, Copy)]
pub struct OrdinaryCtor {
    pub construct: ConcreteFn,
    pub cast: CastFn,
}

/// Role-tagged constructor of a provider.
#[derive(Clone, Copy)]
pub enum Construct {
    /// Stand-alone implementation with a no-argument constructor.
    Ordinary(OrdinaryCtor),
    /// Decorator taking a same-typed predecessor.
    Wrapper(WrapperFn),
    /// Hand-written adaptive dispatcher.
    Adaptive(AdaptiveFn),
}

impl std::fmt::Debug for Construct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Construct::Ordinary(_) => "Ordinary",
            Construct::Wrapper(_) => "Wrapper",
            Construct::Adaptive(_) => "Adaptive",
        })
    }
}

/// One implementation registered for an extension point.
pub struct ProviderRecord {
    /// `TYPE_ID` of the extension point this record implements.
    pub point: &'static str,
    /// Reference string named by descriptor files.
    pub impl_ref: &'static str,
    /// Preferred extension name when the descriptor line carries none.
    pub name: Option<&'static str>,
    /// Conditional-activation metadata.
    pub activate: Option<ActivateMeta>,
    /// Role-tagged constructor.
    pub construct: Construct,
}

inventory::collect!(ProviderRecord);

/// Iterate every provider record linked into the process.
pub fn records() -> impl Iterator<Item = &'static ProviderRecord> {
    inventory::iter::<ProviderRecord>.into_iter()
}

/// Look up a record by implementation reference, regardless of point. Used
/// to distinguish "unknown reference" from "reference of the wrong point".
pub fn record_for_ref(impl_ref: &str) -> Option<&'static ProviderRecord> {
    records().find(|r| r.impl_ref == impl_ref)
}

/// Look up the record a descriptor entry resolves to: the reference must be
/// registered for the loading point.
pub fn record_for(point: &str, impl_ref: &str) -> Option<&'static ProviderRecord> {
    records().find(|r| r.point == point && r.impl_ref == impl_ref)
}

/// Build a [`Construct`] for a point/implementation pair. Shared by
/// [`submit_provider!`] and by [`ProviderSpec`](super::ProviderSpec) users
/// registering extensions programmatically.
///
/// Constructor conventions per role: `ordinary` and `adaptive` types are
/// `Default`; `wrapper` types expose `new(inner: Arc<dyn Point>)`.
#[macro_export]
macro_rules! provider_construct {
    (ordinary: $point:ty, $imp:ty) => {
        $crate::extension::Construct::Ordinary($crate::extension::provider::OrdinaryCtor {
            construct: || {
                ::std::sync::Arc::new(<$imp as ::core::default::Default>::default())
            },
            cast: |instance| {
                instance
                    .downcast::<$imp>()
                    .ok()
                    .map(|concrete| $crate::extension::ErasedExtension::new::<$point>(concrete))
            },
        })
    };
    (wrapper: $point:ty, $imp:ty) => {
        $crate::extension::Construct::Wrapper(|inner| {
            inner.downcast::<$point>().map(|inner| {
                $crate::extension::ErasedExtension::new::<$point>(
                    ::std::sync::Arc::new(<$imp>::new(inner)),
                )
            })
        })
    };
    (adaptive: $point:ty, $imp:ty) => {
        $crate::extension::Construct::Adaptive(|| {
            $crate::extension::ErasedExtension::new::<$point>(
                ::std::sync::Arc::new(<$imp as ::core::default::Default>::default()),
            )
        })
    };
}

/// Register an extension implementation for an extension point.
///
/// The role is fixed by the constructor arm:
///
/// - `ordinary: Type`: `Type: Default`, constructed from nothing;
/// - `wrapper: Type`: `Type::new(inner: Arc<dyn Point>)`, decorates the
///   current composition;
/// - `adaptive: Type`: `Type: Default`, author-provided dispatcher.
///
/// Optional trailing fields: `name: "preferred-name"` and
/// `activate: ActivateMeta { .. }`.
#[macro_export]
macro_rules! submit_provider {
    (point: $point:ty, impl_ref: $impl_ref:literal, ordinary: $imp:ty
     $(, name: $name:literal)? $(, activate: $activate:expr)? $(,)?) => {
        $crate::inventory::submit! {
            $crate::extension::ProviderRecord {
                point: <$point as $crate::extension::ExtensionPoint>::TYPE_ID,
                impl_ref: $impl_ref,
                name: $crate::submit_provider!(@name $($name)?),
                activate: $crate::submit_provider!(@activate $($activate)?),
                construct: $crate::provider_construct!(ordinary: $point, $imp),
            }
        }
    };
    (point: $point:ty, impl_ref: $impl_ref:literal, wrapper: $imp:ty $(,)?) => {
        $crate::inventory::submit! {
            $crate::extension::ProviderRecord {
                point: <$point as $crate::extension::ExtensionPoint>::TYPE_ID,
                impl_ref: $impl_ref,
                name: ::core::option::Option::None,
                activate: ::core::option::Option::None,
                construct: $crate::provider_construct!(wrapper: $point, $imp),
            }
        }
    };
    (point: $point:ty, impl_ref: $impl_ref:literal, adaptive: $imp:ty $(,)?) => {
        $crate::inventory::submit! {
            $crate::extension::ProviderRecord {
                point: <$point as $crate::extension::ExtensionPoint>::TYPE_ID,
                impl_ref: $impl_ref,
                name: ::core::option::Option::None,
                activate: ::core::option::Option::None,
                construct: $crate::provider_construct!(adaptive: $point, $imp),
            }
        }
    };
    (@name) => { ::core::option::Option::None };
    (@name $name:literal) => { ::core::option::Option::Some($name) };
    (@activate) => { ::core::option::Option::None };
    (@activate $activate:expr) => { ::core::option::Option::Some($activate) };
}
