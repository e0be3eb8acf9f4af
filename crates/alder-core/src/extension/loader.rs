//! Per-point extension registries.
//!
//! An [`ExtensionLoader`] is the process-wide singleton registry for one
//! extension point: it owns the descriptor-loaded name table, the per-name
//! instance cache, wrapper composition, dependency injection, and the
//! adaptive stub. Loaders are created lazily through
//! [`ExtensionLoader::get_loader`] and live until shutdown.
//!
//! Construction of a named extension is a fixed protocol: resolve the
//! provider, fetch or build the shared bare instance (implementations that
//! serve several points under one type share it), inject dependencies, then
//! fold the wrapper stack over it in descriptor order, injecting each layer.
//! Wrapper order is deterministic and stable for the lifetime of the
//! registry.

use std::any::Any;
use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::OnceLock;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::error;
use tracing::warn;

use super::activate;
use super::activate::ActivateMeta;
use super::descriptor;
use super::descriptor::DescriptorLine;
use super::error::{self, ExtensionError};
use super::factory::ExtensionFactory;
use super::provider;
use super::provider::AdaptiveFn;
use super::provider::Construct;
use super::provider::ErasedExtension;
use super::provider::OrdinaryCtor;
use super::provider::WrapperFn;
use super::ExtensionPoint;
use crate::constants::comma_split;
use crate::constants::ALDER_DIRECTORY;
use crate::constants::DEFAULT_KEY;
use crate::constants::INTERNAL_DIRECTORY;
use crate::constants::REMOVE_VALUE_PREFIX;
use crate::constants::SERVICES_DIRECTORY;
use crate::constants::TRUE_VALUE;
use crate::url::Url;

// =============================================================================
// Process-wide tables
// =============================================================================

/// One loader, stored both behind its concrete type (for typed access) and
/// behind the erased view (for `ExtensionFactory` resolution by `TypeId`).
struct LoaderEntry {
    typed: Box<dyn Any + Send + Sync>,
    erased: Arc<dyn ErasedLoader>,
}

fn loader_table() -> &'static DashMap<TypeId, LoaderEntry> {
    static TABLE: OnceLock<DashMap<TypeId, LoaderEntry>> = OnceLock::new();
    TABLE.get_or_init(DashMap::new)
}

/// Bare concrete instances shared across extension points, keyed by
/// implementation reference. Two points served by one implementation type
/// observe the same bare instance; each point casts its own view and
/// wrappers are applied per point on top of it.
fn bare_instances() -> &'static DashMap<String, Arc<dyn Any + Send + Sync>> {
    static INSTANCES: OnceLock<DashMap<String, Arc<dyn Any + Send + Sync>>> = OnceLock::new();
    INSTANCES.get_or_init(DashMap::new)
}

/// Type-erased loader view used by extension factories, which resolve
/// points dynamically by token rather than by type parameter.
pub(crate) trait ErasedLoader: Send + Sync {
    fn point_id(&self) -> &'static str;
    fn has_providers(&self) -> bool;
    fn adaptive_erased(&self) -> Result<ErasedExtension, ExtensionError>;
}

/// Look up the erased view of an already-created loader.
pub(crate) fn erased_loader(type_id: TypeId) -> Option<Arc<dyn ErasedLoader>> {
    loader_table().get(&type_id).map(|entry| entry.erased.clone())
}

// =============================================================================
// Loaded descriptor tables
// =============================================================================

#[derive(Clone)]
struct ProviderClass {
    impl_ref: String,
    construct: OrdinaryCtor,
}

#[derive(Clone)]
struct WrapperClass {
    impl_ref: String,
    construct: WrapperFn,
}

#[derive(Clone)]
struct AdaptiveClass {
    impl_ref: String,
    construct: AdaptiveFn,
}

/// Everything descriptor loading produces for one point. Cloned on
/// programmatic mutation (`add`/`replace`) so readers always see a
/// consistent snapshot behind one `Arc`.
#[derive(Clone, Default)]
struct LoadedClasses {
    names: BTreeMap<String, ProviderClass>,
    wrappers: Vec<WrapperClass>,
    adaptive: Option<AdaptiveClass>,
    activates: BTreeMap<String, ActivateMeta>,
    names_by_ref: BTreeMap<String, String>,
    default_name: Option<String>,
    /// Load failures keyed by descriptor line, surfaced in NotFound digests.
    exceptions: BTreeMap<String, String>,
}

/// Programmatic registration payload for [`ExtensionLoader::add`] and
/// [`ExtensionLoader::replace`].
pub struct ProviderSpec {
    pub impl_ref: String,
    pub construct: Construct,
    pub activate: Option<ActivateMeta>,
}

struct InstanceHolder<P: ?Sized> {
    slot: RwLock<Option<Arc<P>>>,
}

struct AdaptiveCell<P: ?Sized> {
    instance: Option<Arc<P>>,
    /// Memoized failure message; adaptive creation is attempted once.
    error: Option<String>,
}

impl<P: ?Sized> Default for AdaptiveCell<P> {
    fn default() -> Self {
        Self { instance: None, error: None }
    }
}

// =============================================================================
// ExtensionLoader
// =============================================================================

/// Process-wide registry for one extension point `P` (a dyn trait type).
pub struct ExtensionLoader<P: ExtensionPoint + ?Sized> {
    /// Shared factory used for dependency injection. `None` only for the
    /// `ExtensionFactory` point itself, which must bootstrap without it.
    object_factory: Option<Arc<dyn ExtensionFactory>>,
    classes: RwLock<Option<Arc<LoadedClasses>>>,
    instances: DashMap<String, Arc<InstanceHolder<P>>>,
    adaptive: RwLock<AdaptiveCell<P>>,
}

impl<P: ExtensionPoint + ?Sized> ExtensionLoader<P> {
    /// Fetch (or create) the singleton loader for `P`.
    pub fn get_loader() -> Arc<ExtensionLoader<P>> {
        let table = loader_table();
        let key = TypeId::of::<P>();
        if let Some(entry) = table.get(&key) {
            return Self::typed_loader(&entry);
        }

        // Construct before touching the table entry: building a loader
        // resolves the shared extension factory, which re-enters this
        // function, and no shard lock may be held across that.
        let loader = Arc::new(Self::new());
        let entry = LoaderEntry {
            typed: Box::new(loader.clone()),
            erased: loader.clone(),
        };
        match table.entry(key) {
            Entry::Occupied(existing) => Self::typed_loader(existing.get()),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                loader
            }
        }
    }

    fn typed_loader(entry: &LoaderEntry) -> Arc<ExtensionLoader<P>> {
        entry
            .typed
            .downcast_ref::<Arc<ExtensionLoader<P>>>()
            .expect("loader table entry is keyed by its own TypeId")
            .clone()
    }

    fn new() -> Self {
        let object_factory = if TypeId::of::<P>() == TypeId::of::<dyn ExtensionFactory>() {
            None
        } else {
            match ExtensionLoader::<dyn ExtensionFactory>::get_loader().get_adaptive() {
                Ok(factory) => Some(factory),
                Err(err) => {
                    error!(point = P::TYPE_ID, error = %err, "failed to resolve the shared extension factory");
                    None
                }
            }
        };
        Self {
            object_factory,
            classes: RwLock::new(None),
            instances: DashMap::new(),
            adaptive: RwLock::new(AdaptiveCell::default()),
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Return the wrapper-composed singleton registered under `name`.
    ///
    /// The special name `"true"` resolves to the configured default. The
    /// first caller constructs the instance under a per-name lock; later
    /// callers observe the published value on the lock-free read path.
    pub fn get(&self, name: &str) -> Result<Arc<P>, ExtensionError> {
        if name.is_empty() {
            return error::EmptyNameSnafu { type_id: P::TYPE_ID }.fail();
        }
        if name == TRUE_VALUE {
            return self
                .default_extension()?
                .ok_or_else(|| error::NoDefaultSnafu { type_id: P::TYPE_ID }.build());
        }

        let holder = self
            .instances
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InstanceHolder { slot: RwLock::new(None) }))
            .value()
            .clone();

        if let Some(instance) = holder.slot.read().clone() {
            return Ok(instance);
        }
        let mut slot = holder.slot.write();
        if let Some(instance) = slot.clone() {
            return Ok(instance);
        }
        let instance = self.create_extension(name)?;
        *slot = Some(instance.clone());
        Ok(instance)
    }

    /// Return the default extension, `None` when the point declares none.
    pub fn default_extension(&self) -> Result<Option<Arc<P>>, ExtensionError> {
        let classes = self.classes()?;
        match classes.default_name.clone() {
            Some(name) if name != TRUE_VALUE => Ok(Some(self.get(&name)?)),
            _ => Ok(None),
        }
    }

    /// Return the adaptive dispatcher singleton for this point.
    ///
    /// An author-provided adaptive implementation wins; otherwise the
    /// point's [`ExtensionPoint::synthesize_adaptive`] hook builds a stub.
    /// A creation failure is memoized: subsequent calls fail fast with the
    /// original cause instead of retrying.
    pub fn get_adaptive(&self) -> Result<Arc<P>, ExtensionError> {
        {
            let cell = self.adaptive.read();
            if let Some(instance) = &cell.instance {
                return Ok(instance.clone());
            }
            if let Some(message) = &cell.error {
                return error::AdaptiveCreationSnafu {
                    type_id: P::TYPE_ID,
                    message: message.clone(),
                }
                .fail();
            }
        }

        let mut cell = self.adaptive.write();
        if let Some(instance) = &cell.instance {
            return Ok(instance.clone());
        }
        if let Some(message) = &cell.error {
            return error::AdaptiveCreationSnafu {
                type_id: P::TYPE_ID,
                message: message.clone(),
            }
            .fail();
        }
        match self.create_adaptive() {
            Ok(instance) => {
                cell.instance = Some(instance.clone());
                Ok(instance)
            }
            Err(err) => {
                cell.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Ordered activated extensions for a URL, an explicit name list, and an
    /// optional group.
    ///
    /// Implementations whose activation metadata matches the group and URL
    /// are included implicitly (unless `-default` appears), sorted by their
    /// before/after/order hints. Explicit names follow in list order;
    /// `default` marks where the implicit batch sits relative to them, and
    /// `-name` removes a name from both lists.
    pub fn get_activate(
        &self,
        url: &Url,
        names: &[&str],
        group: Option<&str>,
    ) -> Result<Vec<Arc<P>>, ExtensionError> {
        let removed = |name: &str| {
            names
                .iter()
                .any(|n| n.strip_prefix(REMOVE_VALUE_PREFIX) == Some(name))
        };

        let mut activated = Vec::new();
        if !removed(DEFAULT_KEY) {
            let classes = self.classes()?;
            let mut implicit: Vec<(&String, &ActivateMeta)> = classes
                .activates
                .iter()
                .filter(|(name, meta)| {
                    activate::group_matches(group, meta)
                        && !names.contains(&name.as_str())
                        && !removed(name.as_str())
                        && activate::url_matches(url, meta)
                })
                .collect();
            implicit.sort_by(|a, b| activate::compare((a.0.as_str(), a.1), (b.0.as_str(), b.1)));
            for (name, _) in implicit {
                activated.push(self.get(name)?);
            }
        }

        let mut explicit = Vec::new();
        for &name in names {
            if name.starts_with(REMOVE_VALUE_PREFIX) || removed(name) {
                continue;
            }
            if name == DEFAULT_KEY {
                // Names listed before `default` go ahead of the implicit batch.
                if !explicit.is_empty() {
                    activated.splice(0..0, explicit.drain(..));
                }
            } else {
                explicit.push(self.get(name)?);
            }
        }
        activated.extend(explicit);
        Ok(activated)
    }

    /// [`ExtensionLoader::get_activate`] with the name list read from a
    /// comma-separated URL parameter.
    pub fn get_activate_by_key(
        &self,
        url: &Url,
        key: &str,
        group: Option<&str>,
    ) -> Result<Vec<Arc<P>>, ExtensionError> {
        let value = url.parameter(key).unwrap_or_default();
        self.get_activate(url, &comma_split(value), group)
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// True when `name` is registered (never triggers instantiation).
    pub fn has(&self, name: &str) -> bool {
        self.classes()
            .map(|classes| classes.names.contains_key(name))
            .unwrap_or(false)
    }

    /// Sorted names of every registered ordinary extension.
    pub fn supported_names(&self) -> Result<Vec<String>, ExtensionError> {
        Ok(self.classes()?.names.keys().cloned().collect())
    }

    /// Declared default name, if any.
    pub fn default_name(&self) -> Result<Option<String>, ExtensionError> {
        Ok(self.classes()?.default_name.clone())
    }

    /// Sorted names whose singletons have already been constructed.
    pub fn loaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .instances
            .iter()
            .filter(|entry| entry.value().slot.read().is_some())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Already-constructed singleton for `name`; never triggers construction.
    pub fn get_loaded(&self, name: &str) -> Option<Arc<P>> {
        self.instances
            .get(name)
            .and_then(|holder| holder.slot.read().clone())
    }

    /// First registered name of an implementation reference.
    pub fn extension_name_of(&self, impl_ref: &str) -> Option<String> {
        self.classes()
            .ok()
            .and_then(|classes| classes.names_by_ref.get(impl_ref).cloned())
    }

    // -------------------------------------------------------------------------
    // Programmatic registration
    // -------------------------------------------------------------------------

    /// Register an extension at runtime. Ordinary registrations reject
    /// duplicate names; an adaptive registration rejects a second adaptive.
    pub fn add(&self, name: &str, spec: ProviderSpec) -> Result<(), ExtensionError> {
        let mut slot = self.classes.write();
        let mut classes = match &*slot {
            Some(existing) => (**existing).clone(),
            None => self.load_classes()?,
        };
        match spec.construct {
            Construct::Adaptive(construct) => {
                if classes.adaptive.is_some() {
                    return error::AdaptiveExistsSnafu { type_id: P::TYPE_ID }.fail();
                }
                classes.adaptive = Some(AdaptiveClass { impl_ref: spec.impl_ref, construct });
            }
            Construct::Wrapper(construct) => {
                if !classes.wrappers.iter().any(|w| w.impl_ref == spec.impl_ref) {
                    classes.wrappers.push(WrapperClass { impl_ref: spec.impl_ref, construct });
                }
            }
            Construct::Ordinary(construct) => {
                if name.is_empty() {
                    return error::EmptyNameSnafu { type_id: P::TYPE_ID }.fail();
                }
                if classes.names.contains_key(name) {
                    return error::NameExistsSnafu {
                        type_id: P::TYPE_ID,
                        name: name.to_string(),
                    }
                    .fail();
                }
                if let Some(meta) = spec.activate {
                    classes.activates.insert(name.to_string(), meta);
                }
                classes
                    .names_by_ref
                    .entry(spec.impl_ref.clone())
                    .or_insert_with(|| name.to_string());
                classes.names.insert(
                    name.to_string(),
                    ProviderClass { impl_ref: spec.impl_ref, construct },
                );
            }
        }
        *slot = Some(Arc::new(classes));
        Ok(())
    }

    /// Replace an existing registration. Intended for tests; the replaced
    /// name's cached singleton (or the adaptive instance) is dropped so the
    /// next lookup rebuilds it.
    pub fn replace(&self, name: &str, spec: ProviderSpec) -> Result<(), ExtensionError> {
        let replaced_adaptive;
        {
            let mut slot = self.classes.write();
            let mut classes = match &*slot {
                Some(existing) => (**existing).clone(),
                None => self.load_classes()?,
            };
            match spec.construct {
                Construct::Adaptive(construct) => {
                    if classes.adaptive.is_none() {
                        return error::AdaptiveMissingSnafu { type_id: P::TYPE_ID }.fail();
                    }
                    classes.adaptive = Some(AdaptiveClass { impl_ref: spec.impl_ref, construct });
                    replaced_adaptive = true;
                }
                Construct::Wrapper(construct) => {
                    if let Some(existing) =
                        classes.wrappers.iter_mut().find(|w| w.impl_ref == spec.impl_ref)
                    {
                        existing.construct = construct;
                    } else {
                        classes.wrappers.push(WrapperClass { impl_ref: spec.impl_ref, construct });
                    }
                    replaced_adaptive = false;
                }
                Construct::Ordinary(construct) => {
                    if !classes.names.contains_key(name) {
                        return error::NameMissingSnafu {
                            type_id: P::TYPE_ID,
                            name: name.to_string(),
                        }
                        .fail();
                    }
                    if let Some(meta) = spec.activate {
                        classes.activates.insert(name.to_string(), meta);
                    }
                    classes
                        .names_by_ref
                        .entry(spec.impl_ref.clone())
                        .or_insert_with(|| name.to_string());
                    classes.names.insert(
                        name.to_string(),
                        ProviderClass { impl_ref: spec.impl_ref, construct },
                    );
                    replaced_adaptive = false;
                }
            }
            *slot = Some(Arc::new(classes));
        }
        // Cache invalidation happens outside the classes lock; get_adaptive
        // acquires the adaptive cell first and the classes lock second.
        if replaced_adaptive {
            *self.adaptive.write() = AdaptiveCell::default();
        } else {
            self.instances.remove(name);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    fn classes(&self) -> Result<Arc<LoadedClasses>, ExtensionError> {
        if let Some(classes) = self.classes.read().clone() {
            return Ok(classes);
        }
        let mut slot = self.classes.write();
        if let Some(classes) = slot.clone() {
            return Ok(classes);
        }
        let loaded = Arc::new(self.load_classes()?);
        *slot = Some(loaded.clone());
        Ok(loaded)
    }

    fn load_classes(&self) -> Result<LoadedClasses, ExtensionError> {
        let mut loaded = LoadedClasses::default();

        let declared = comma_split(P::DEFAULT);
        if declared.len() > 1 {
            return error::MultipleDefaultsSnafu {
                type_id: P::TYPE_ID,
                names: declared.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
            }
            .fail();
        }
        loaded.default_name = declared.first().map(|n| n.to_string());

        for root in [INTERNAL_DIRECTORY, ALDER_DIRECTORY, SERVICES_DIRECTORY] {
            for resource in descriptor::resources_for(root, P::TYPE_ID) {
                for line in descriptor::parse(&resource) {
                    if let Err(failure) = load_entry::<P>(&mut loaded, &line) {
                        warn!(
                            point = P::TYPE_ID,
                            origin = %line.origin,
                            line = %line.text,
                            failure = %failure,
                            "failed to load extension descriptor entry"
                        );
                        loaded.exceptions.insert(line.text.clone(), failure);
                    }
                }
            }
        }
        Ok(loaded)
    }

    fn create_extension(&self, name: &str) -> Result<Arc<P>, ExtensionError> {
        let classes = self.classes()?;
        let provider = classes
            .names
            .get(name)
            .ok_or_else(|| self.not_found(&classes, name))?;

        // Bare instances are shared across points; racing constructors may
        // both build one, but only the first insert is published.
        let concrete = match bare_instances().get(&provider.impl_ref) {
            Some(existing) => existing.value().clone(),
            None => {
                let constructed = (provider.construct.construct)();
                bare_instances()
                    .entry(provider.impl_ref.clone())
                    .or_insert(constructed)
                    .value()
                    .clone()
            }
        };
        let mut instance = (provider.construct.cast)(concrete)
            .and_then(|erased| erased.downcast::<P>())
            .ok_or_else(|| {
                error::InstantiationSnafu {
                    type_id: P::TYPE_ID,
                    name: name.to_string(),
                    reason: format!(
                        "constructor of {} produced a foreign type",
                        provider.impl_ref
                    ),
                }
                .build()
            })?;
        self.inject_instance(&instance);

        for wrapper in &classes.wrappers {
            let wrapped = (wrapper.construct)(&ErasedExtension::new::<P>(instance.clone()))
                .and_then(|erased| erased.downcast::<P>())
                .ok_or_else(|| {
                    error::InstantiationSnafu {
                        type_id: P::TYPE_ID,
                        name: name.to_string(),
                        reason: format!("wrapper {} rejected the composed instance", wrapper.impl_ref),
                    }
                    .build()
                })?;
            self.inject_instance(&wrapped);
            instance = wrapped;
        }
        Ok(instance)
    }

    fn create_adaptive(&self) -> Result<Arc<P>, ExtensionError> {
        let classes = self.classes()?;
        let instance = match &classes.adaptive {
            Some(adaptive) => (adaptive.construct)().downcast::<P>().ok_or_else(|| {
                error::AdaptiveCreationSnafu {
                    type_id: P::TYPE_ID,
                    message: format!(
                        "constructor of {} produced a foreign type",
                        adaptive.impl_ref
                    ),
                }
                .build()
            })?,
            None => P::synthesize_adaptive(Self::get_loader())?,
        };
        self.inject_instance(&instance);
        Ok(instance)
    }

    fn inject_instance(&self, instance: &Arc<P>) {
        if let Some(factory) = &self.object_factory {
            if let Err(err) = instance.inject(factory.as_ref()) {
                error!(point = P::TYPE_ID, error = %err, "failed to inject extension dependencies");
            }
        }
    }

    fn not_found(&self, classes: &LoadedClasses, name: &str) -> ExtensionError {
        let needle = name.to_lowercase();
        for (line, cause) in &classes.exceptions {
            if line.to_lowercase().contains(&needle) {
                return error::NotFoundSnafu {
                    type_id: P::TYPE_ID,
                    name: name.to_string(),
                    digest: format!(
                        "no such extension {} by name {}, cause: {cause}",
                        P::TYPE_ID,
                        name
                    ),
                }
                .build();
            }
        }
        let mut digest = format!("no such extension {} by name {}", P::TYPE_ID, name);
        for (i, (line, cause)) in classes.exceptions.iter().enumerate() {
            if i == 0 {
                digest.push_str(", possible causes: ");
            }
            digest.push_str(&format!("\n({}) {line}:\n{cause}", i + 1));
        }
        error::NotFoundSnafu {
            type_id: P::TYPE_ID,
            name: name.to_string(),
            digest,
        }
        .build()
    }
}

impl<P: ExtensionPoint + ?Sized> ErasedLoader for ExtensionLoader<P> {
    fn point_id(&self) -> &'static str {
        P::TYPE_ID
    }

    fn has_providers(&self) -> bool {
        self.supported_names().map(|names| !names.is_empty()).unwrap_or(false)
    }

    fn adaptive_erased(&self) -> Result<ErasedExtension, ExtensionError> {
        self.get_adaptive().map(ErasedExtension::new::<P>)
    }
}

/// Process one descriptor entry into the loaded tables. A returned `Err`
/// is the per-line failure text recorded for NotFound digests.
fn load_entry<P: ExtensionPoint + ?Sized>(
    loaded: &mut LoadedClasses,
    line: &DescriptorLine,
) -> Result<(), String> {
    let record = match provider::record_for(P::TYPE_ID, &line.impl_ref) {
        Some(record) => record,
        None => {
            return Err(match provider::record_for_ref(&line.impl_ref) {
                Some(other) => format!(
                    "implementation {} does not implement extension point {} (registered for {})",
                    line.impl_ref,
                    P::TYPE_ID,
                    other.point
                ),
                None => format!(
                    "no provider record for {} (is the implementation crate linked?)",
                    line.impl_ref
                ),
            });
        }
    };

    match record.construct {
        Construct::Adaptive(construct) => match &loaded.adaptive {
            Some(existing) if existing.impl_ref != record.impl_ref => {
                return Err(format!(
                    "more than one adaptive implementation found: {}, {}",
                    existing.impl_ref, record.impl_ref
                ));
            }
            Some(_) => {}
            None => {
                loaded.adaptive = Some(AdaptiveClass {
                    impl_ref: record.impl_ref.to_string(),
                    construct,
                });
            }
        },
        Construct::Wrapper(construct) => {
            if !loaded.wrappers.iter().any(|w| w.impl_ref == record.impl_ref) {
                loaded.wrappers.push(WrapperClass {
                    impl_ref: record.impl_ref.to_string(),
                    construct,
                });
            }
        }
        Construct::Ordinary(construct) => {
            let names: Vec<String> = match &line.name {
                Some(explicit) => comma_split(explicit).iter().map(|n| n.to_string()).collect(),
                None => {
                    let inferred = record
                        .name
                        .map(str::to_string)
                        .or_else(|| descriptor::infer_name(&line.impl_ref, P::TYPE_NAME))
                        .ok_or_else(|| {
                            format!("no extension name for {} in {}", line.impl_ref, line.origin)
                        })?;
                    vec![inferred]
                }
            };
            if names.is_empty() {
                return Err(format!(
                    "no extension name for {} in {}",
                    line.impl_ref, line.origin
                ));
            }

            if let Some(meta) = record.activate {
                loaded.activates.entry(names[0].clone()).or_insert(meta);
            }
            loaded
                .names_by_ref
                .entry(record.impl_ref.to_string())
                .or_insert_with(|| names[0].clone());

            for name in names {
                match loaded.names.get(&name) {
                    Some(existing) if existing.impl_ref != record.impl_ref => {
                        return Err(format!(
                            "duplicate extension name {name} on {} and {}",
                            existing.impl_ref, record.impl_ref
                        ));
                    }
                    Some(_) => {}
                    None => {
                        loaded.names.insert(
                            name,
                            ProviderClass {
                                impl_ref: record.impl_ref.to_string(),
                                construct,
                            },
                        );
                    }
                }
            }
        }
    }
    Ok(())
}
