//! Extension factories and dependency injection.
//!
//! `ExtensionFactory` is itself an extension point, the one every other
//! loader consults when injecting dependencies. Its adaptive implementation
//! is hand-written ([`AdaptiveExtensionFactory`]) so the bootstrap has no
//! cycle: resolving any point's loader needs the factory, and the factory's
//! own loader is the single one built without it.

use std::any::TypeId;
use std::sync::Arc;

use tracing::warn;

use super::error::{self, ExtensionError};
use super::loader;
use super::loader::ExtensionLoader;
use super::provider::ErasedExtension;
use super::Extension;
use super::ExtensionPoint;
use crate::constants::INTERNAL_DIRECTORY;
use crate::submit_descriptor;
use crate::submit_provider;

/// Runtime token identifying an extension point: the `TypeId` of its dyn
/// trait type plus its stable string id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointToken {
    type_id: TypeId,
    id: &'static str,
}

impl PointToken {
    pub fn of<P: ExtensionPoint + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            id: P::TYPE_ID,
        }
    }

    /// Stable string id of the point.
    pub fn id(&self) -> &'static str {
        self.id
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }
}

/// Source of injectable dependencies.
///
/// `create` resolves the value to assign to a dependency of the given point
/// named `name` (the property name), or `None` when this factory has
/// nothing for it.
pub trait ExtensionFactory: Extension {
    fn create(&self, point: PointToken, name: &str) -> Option<ErasedExtension>;
}

impl ExtensionPoint for dyn ExtensionFactory {
    const TYPE_ID: &'static str = "alder.extension.ExtensionFactory";
    const TYPE_NAME: &'static str = "ExtensionFactory";
    const DEFAULT: &'static str = "";
}

/// Resolve the adaptive stub of point `P` through the shared factory.
///
/// This is the helper `Extension::inject` implementations call for each of
/// their dependencies. It first touches `P`'s loader so factories that
/// resolve points dynamically can find it in the process-wide table.
pub fn inject_adaptive<P: ExtensionPoint + ?Sized>(
    factory: &dyn ExtensionFactory,
    property: &str,
) -> Result<Arc<P>, ExtensionError> {
    let _ = ExtensionLoader::<P>::get_loader();
    factory
        .create(PointToken::of::<P>(), property)
        .and_then(|erased| erased.downcast::<P>())
        .ok_or_else(|| {
            error::InjectionSnafu {
                point: P::TYPE_ID,
                property: property.to_string(),
            }
            .build()
        })
}

/// The hand-written adaptive factory: consults every registered ordinary
/// factory in name order and returns the first hit.
pub struct AdaptiveExtensionFactory {
    factories: Vec<Arc<dyn ExtensionFactory>>,
}

impl Default for AdaptiveExtensionFactory {
    fn default() -> Self {
        let loader = ExtensionLoader::<dyn ExtensionFactory>::get_loader();
        let mut factories = Vec::new();
        for name in loader.supported_names().unwrap_or_default() {
            match loader.get(&name) {
                Ok(factory) => factories.push(factory),
                Err(err) => {
                    warn!(factory = %name, error = %err, "skipping unusable extension factory");
                }
            }
        }
        Self { factories }
    }
}

impl Extension for AdaptiveExtensionFactory {}

impl ExtensionFactory for AdaptiveExtensionFactory {
    fn create(&self, point: PointToken, name: &str) -> Option<ErasedExtension> {
        self.factories.iter().find_map(|factory| factory.create(point, name))
    }
}

/// Factory backed by the extension registries themselves: a dependency on
/// an extension point resolves to that point's adaptive stub, provided the
/// point has at least one registered implementation.
#[derive(Default)]
pub struct RegistryExtensionFactory;

impl Extension for RegistryExtensionFactory {}

impl ExtensionFactory for RegistryExtensionFactory {
    fn create(&self, point: PointToken, _name: &str) -> Option<ErasedExtension> {
        let target = loader::erased_loader(point.type_id())?;
        if !target.has_providers() {
            return None;
        }
        match target.adaptive_erased() {
            Ok(erased) => Some(erased),
            Err(err) => {
                warn!(point = point.id(), error = %err, "failed to resolve adaptive extension for injection");
                None
            }
        }
    }
}

submit_provider! {
    point: dyn ExtensionFactory,
    impl_ref: "alder_core::extension::factory::AdaptiveExtensionFactory",
    adaptive: AdaptiveExtensionFactory,
}

submit_provider! {
    point: dyn ExtensionFactory,
    impl_ref: "alder_core::extension::factory::RegistryExtensionFactory",
    ordinary: RegistryExtensionFactory,
}

submit_descriptor! {
    root: INTERNAL_DIRECTORY,
    type_id: "alder.extension.ExtensionFactory",
    contents: "adaptive=alder_core::extension::factory::AdaptiveExtensionFactory\n\
               registry=alder_core::extension::factory::RegistryExtensionFactory\n",
}
