//! End-to-end tests of the extension resolution engine: descriptor loading,
//! name inference, wrapper composition, adaptive dispatch, activation,
//! injection, and programmatic registration.
//!
//! All fixtures are registered through the same link-time machinery real
//! extensions use, so these tests cover the full load path.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::OnceLock;

use alder_core::constants::ALDER_DIRECTORY;
use alder_core::extension::inject_adaptive;
use alder_core::extension::ActivateMeta;
use alder_core::extension::AdaptivePlan;
use alder_core::extension::Extension;
use alder_core::extension::ExtensionError;
use alder_core::extension::ExtensionFactory;
use alder_core::extension::ExtensionLoader;
use alder_core::extension::ExtensionPoint;
use alder_core::extension::ProviderSpec;
use alder_core::provider_construct;
use alder_core::submit_descriptor;
use alder_core::submit_provider;
use alder_core::Url;

// =============================================================================
// Fixture: Greeting (defaults, inference, wrappers, load errors)
// =============================================================================

pub trait Greeting: Extension {
    fn greet(&self) -> String;
}

impl ExtensionPoint for dyn Greeting {
    const TYPE_ID: &'static str = "alder.test.Greeting";
    const TYPE_NAME: &'static str = "Greeting";
    const DEFAULT: &'static str = "plain";
}

impl std::fmt::Debug for dyn Greeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Greeting").field("greet", &self.greet()).finish()
    }
}

#[derive(Default)]
pub struct PlainGreeting;
impl Extension for PlainGreeting {}
impl Greeting for PlainGreeting {
    fn greet(&self) -> String {
        "plain".to_string()
    }
}

#[derive(Default)]
pub struct LoudGreeting;
impl Extension for LoudGreeting {}
impl Greeting for LoudGreeting {
    fn greet(&self) -> String {
        "loud".to_string()
    }
}

pub struct TimedGreeting {
    inner: Arc<dyn Greeting>,
}
impl TimedGreeting {
    pub fn new(inner: Arc<dyn Greeting>) -> Self {
        Self { inner }
    }
}
impl Extension for TimedGreeting {}
impl Greeting for TimedGreeting {
    fn greet(&self) -> String {
        format!("timed({})", self.inner.greet())
    }
}

pub struct TracedGreeting {
    inner: Arc<dyn Greeting>,
}
impl TracedGreeting {
    pub fn new(inner: Arc<dyn Greeting>) -> Self {
        Self { inner }
    }
}
impl Extension for TracedGreeting {}
impl Greeting for TracedGreeting {
    fn greet(&self) -> String {
        format!("traced({})", self.inner.greet())
    }
}

#[derive(Default)]
pub struct ExtraGreeting;
impl Extension for ExtraGreeting {}
impl Greeting for ExtraGreeting {
    fn greet(&self) -> String {
        "extra".to_string()
    }
}

#[derive(Default)]
pub struct SwappedGreeting;
impl Extension for SwappedGreeting {}
impl Greeting for SwappedGreeting {
    fn greet(&self) -> String {
        "swapped".to_string()
    }
}

submit_provider! {
    point: dyn Greeting,
    impl_ref: "alder_fixtures::greeting::PlainGreeting",
    ordinary: PlainGreeting,
}
submit_provider! {
    point: dyn Greeting,
    impl_ref: "alder_fixtures::greeting::LoudGreeting",
    ordinary: LoudGreeting,
}
submit_provider! {
    point: dyn Greeting,
    impl_ref: "alder_fixtures::greeting::TimedGreeting",
    wrapper: TimedGreeting,
}
submit_provider! {
    point: dyn Greeting,
    impl_ref: "alder_fixtures::greeting::TracedGreeting",
    wrapper: TracedGreeting,
}

// `PlainGreeting` exercises name inference (bare ref). The `t=` entry names
// a wrapper, which never lands in the name table. The `missing=` entry
// references an unlinked implementation and the `shared=` entry references
// an implementation of a different point; both are per-line load failures.
submit_descriptor! {
    root: ALDER_DIRECTORY,
    type_id: "alder.test.Greeting",
    contents: "# greeting fixtures\n\
               alder_fixtures::greeting::PlainGreeting\n\
               loud,shout=alder_fixtures::greeting::LoudGreeting\n\
               alder_fixtures::greeting::TimedGreeting\n\
               t=alder_fixtures::greeting::TracedGreeting\n\
               missing=alder_fixtures::greeting::AbsentGreeting\n\
               shared=alder_fixtures::shared::SharedPort\n",
}

fn greeting_loader() -> Arc<ExtensionLoader<dyn Greeting>> {
    ExtensionLoader::<dyn Greeting>::get_loader()
}

#[test]
fn descriptor_names_resolve_with_inference() {
    let loader = greeting_loader();
    // `plain` comes from a bare ref via name inference. Other tests may add
    // names at runtime, so assert membership rather than the exact set.
    let supported = loader.supported_names().expect("loads");
    assert!(supported.contains(&"plain".to_string()));
    assert!(supported.contains(&"loud".to_string()));
    assert!(!supported.contains(&"t".to_string()));
    assert!(loader.has("plain"));
    assert!(!loader.has("t"));
    assert_eq!(loader.default_name().expect("loads").as_deref(), Some("plain"));
}

#[test]
fn wrappers_compose_in_descriptor_order_around_the_ordinary_instance() {
    let loud = greeting_loader().get("loud").expect("registered");
    assert_eq!(loud.greet(), "traced(timed(loud))");
}

#[test]
fn alias_names_share_the_implementation() {
    let loader = greeting_loader();
    let alias = loader.get("shout").expect("second name of the same entry");
    assert_eq!(alias.greet(), "traced(timed(loud))");
    // The first name of the entry is the canonical one.
    assert_eq!(
        loader
            .extension_name_of("alder_fixtures::greeting::LoudGreeting")
            .as_deref(),
        Some("loud")
    );
}

#[test]
fn true_resolves_to_the_wrapped_default() {
    let by_true = greeting_loader().get("true").expect("default configured");
    assert_eq!(by_true.greet(), "traced(timed(plain))");
    let by_default = greeting_loader()
        .default_extension()
        .expect("loads")
        .expect("default configured");
    assert!(Arc::ptr_eq(&by_true, &by_default));
}

#[test]
fn wrapper_names_are_not_ordinary_extensions() {
    let error = greeting_loader().get("t").expect_err("wrapper has no name");
    assert!(matches!(error, ExtensionError::NotFound { .. }));
}

#[test]
fn concurrent_lookups_observe_one_singleton() {
    let mut instances = Vec::new();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| greeting_loader().get("plain").expect("registered")))
            .collect();
        for handle in handles {
            instances.push(handle.join().expect("no panic"));
        }
    });
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}

#[test]
fn loaded_names_track_constructed_singletons_only() {
    let loader = greeting_loader();
    assert!(loader.get_loaded("never-requested").is_none());
    loader.get("loud").expect("registered");
    assert!(loader.loaded_names().contains(&"loud".to_string()));
    assert!(loader.get_loaded("loud").is_some());
}

#[test]
fn not_found_digest_quotes_matching_load_failures() {
    let error = greeting_loader().get("missing").expect_err("never loads");
    let text = error.to_string();
    assert!(text.contains("missing=alder_fixtures::greeting::AbsentGreeting"), "{text}");
    assert!(text.contains("is the implementation crate linked"), "{text}");
}

#[test]
fn entries_of_a_foreign_point_are_fatal_for_that_line_only() {
    let error = greeting_loader().get("shared").expect_err("wrong point");
    assert!(error.to_string().contains("does not implement extension point"), "{error}");
    // The bad lines did not poison the rest of the file.
    assert!(greeting_loader().get("loud").is_ok());
}

#[test]
fn empty_names_are_rejected() {
    assert!(matches!(
        greeting_loader().get("").expect_err("empty name"),
        ExtensionError::EmptyName { .. }
    ));
}

#[test]
fn loading_is_idempotent() {
    let first = greeting_loader().supported_names().expect("loads");
    let second = greeting_loader().supported_names().expect("loads");
    assert_eq!(first, second);
}

#[test]
fn programmatic_add_and_replace() {
    let loader = greeting_loader();
    loader
        .add(
            "extra",
            ProviderSpec {
                impl_ref: "alder_fixtures::greeting::ExtraGreeting".to_string(),
                construct: provider_construct!(ordinary: dyn Greeting, ExtraGreeting),
                activate: None,
            },
        )
        .expect("fresh name");
    assert_eq!(loader.get("extra").expect("added").greet(), "traced(timed(extra))");

    let duplicate = loader.add(
        "extra",
        ProviderSpec {
            impl_ref: "alder_fixtures::greeting::ExtraGreeting".to_string(),
            construct: provider_construct!(ordinary: dyn Greeting, ExtraGreeting),
            activate: None,
        },
    );
    assert!(matches!(duplicate, Err(ExtensionError::NameExists { .. })));

    loader
        .replace(
            "extra",
            ProviderSpec {
                impl_ref: "alder_fixtures::greeting::SwappedGreeting".to_string(),
                construct: provider_construct!(ordinary: dyn Greeting, SwappedGreeting),
                activate: None,
            },
        )
        .expect("name exists");
    assert_eq!(loader.get("extra").expect("replaced").greet(), "traced(timed(swapped))");

    let absent = loader.replace(
        "never-there",
        ProviderSpec {
            impl_ref: "alder_fixtures::greeting::SwappedGreeting".to_string(),
            construct: provider_construct!(ordinary: dyn Greeting, SwappedGreeting),
            activate: None,
        },
    );
    assert!(matches!(absent, Err(ExtensionError::NameMissing { .. })));
}

// =============================================================================
// Fixture: Route (adaptive dispatch by URL)
// =============================================================================

/// A caller handle exposing its URL through an accessor, the way an
/// invoker does. Adaptive dispatch pulls the URL out of it.
pub struct Caller {
    url: Option<Url>,
}

impl Caller {
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }
}

/// Minimal method-call carrier for method-scoped parameter lookups.
pub struct TestCall {
    method: String,
}

impl alder_core::Invocation for TestCall {
    fn method_name(&self) -> &str {
        &self.method
    }
}

pub trait Route: Extension {
    /// Adaptive: selects by the `router` parameter, then the URL scheme.
    fn route(&self, url: &Url) -> Result<String, ExtensionError>;

    /// Adaptive: the URL comes from the caller's accessor, the key is
    /// scoped by the call's method name.
    fn dispatch(&self, caller: &Caller, call: &TestCall) -> Result<String, ExtensionError>;

    /// Not adaptive; only concrete implementations can answer.
    fn reset(&self) -> Result<(), ExtensionError>;
}

struct AdaptiveRoute {
    loader: Arc<ExtensionLoader<dyn Route>>,
    route_plan: AdaptivePlan,
    dispatch_plan: AdaptivePlan,
}
impl Extension for AdaptiveRoute {}
impl Route for AdaptiveRoute {
    fn route(&self, url: &Url) -> Result<String, ExtensionError> {
        self.route_plan.select(&self.loader, url, None)?.route(url)
    }

    fn dispatch(&self, caller: &Caller, call: &TestCall) -> Result<String, ExtensionError> {
        use alder_core::Invocation;
        let url = alder_core::extension::adaptive::require_url::<dyn Route>(caller.url())?;
        let delegate =
            self.dispatch_plan
                .select(&self.loader, url, Some(call.method_name()))?;
        delegate.dispatch(caller, call)
    }

    fn reset(&self) -> Result<(), ExtensionError> {
        Err(ExtensionError::UnsupportedOperation {
            type_id: <dyn Route as ExtensionPoint>::TYPE_ID,
            method: "reset",
        })
    }
}

impl ExtensionPoint for dyn Route {
    const TYPE_ID: &'static str = "alder.test.Route";
    const TYPE_NAME: &'static str = "Route";
    const DEFAULT: &'static str = "static";

    fn synthesize_adaptive(
        loader: Arc<ExtensionLoader<Self>>,
    ) -> Result<Arc<Self>, ExtensionError> {
        let route_plan = AdaptivePlan::for_point::<dyn Route>(&loader, &["router", "protocol"])?;
        let dispatch_plan = AdaptivePlan::for_point::<dyn Route>(&loader, &["router"])?;
        Ok(Arc::new(AdaptiveRoute { loader, route_plan, dispatch_plan }))
    }
}

#[derive(Default)]
pub struct StaticRoute;
impl Extension for StaticRoute {}
impl Route for StaticRoute {
    fn route(&self, url: &Url) -> Result<String, ExtensionError> {
        Ok(format!("static->{}", url.host()))
    }

    fn dispatch(&self, _caller: &Caller, call: &TestCall) -> Result<String, ExtensionError> {
        Ok(format!("static.{}", call.method))
    }

    fn reset(&self) -> Result<(), ExtensionError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MeshRoute;
impl Extension for MeshRoute {}
impl Route for MeshRoute {
    fn route(&self, url: &Url) -> Result<String, ExtensionError> {
        Ok(format!("mesh->{}", url.address()))
    }

    fn dispatch(&self, _caller: &Caller, call: &TestCall) -> Result<String, ExtensionError> {
        Ok(format!("mesh.{}", call.method))
    }

    fn reset(&self) -> Result<(), ExtensionError> {
        Ok(())
    }
}

submit_provider! {
    point: dyn Route,
    impl_ref: "alder_fixtures::route::StaticRoute",
    ordinary: StaticRoute,
}
submit_provider! {
    point: dyn Route,
    impl_ref: "alder_fixtures::route::MeshRoute",
    ordinary: MeshRoute,
}
submit_descriptor! {
    root: ALDER_DIRECTORY,
    type_id: "alder.test.Route",
    contents: "static=alder_fixtures::route::StaticRoute\n\
               mesh=alder_fixtures::route::MeshRoute\n",
}

fn route_loader() -> Arc<ExtensionLoader<dyn Route>> {
    ExtensionLoader::<dyn Route>::get_loader()
}

#[test]
fn adaptive_routes_by_url_scheme() {
    let adaptive = route_loader().get_adaptive().expect("synthesizes");
    let url = Url::parse("mesh://host:20880/x").expect("valid url");
    assert_eq!(adaptive.route(&url).expect("routes"), "mesh->host:20880");
}

#[test]
fn adaptive_prefers_the_leftmost_configured_key() {
    let adaptive = route_loader().get_adaptive().expect("synthesizes");
    let url = Url::parse("mesh://host/x?router=static").expect("valid url");
    assert_eq!(adaptive.route(&url).expect("routes"), "static->host");
}

#[test]
fn adaptive_selection_of_an_unknown_name_fails_lookup() {
    let adaptive = route_loader().get_adaptive().expect("synthesizes");
    let url = Url::parse("nowhere://host/x").expect("valid url");
    assert!(matches!(
        adaptive.route(&url).expect_err("no such extension"),
        ExtensionError::NotFound { .. }
    ));
}

#[test]
fn adaptive_instance_is_cached() {
    let a = route_loader().get_adaptive().expect("synthesizes");
    let b = route_loader().get_adaptive().expect("synthesizes");
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn adaptive_extracts_the_url_from_an_argument_accessor() {
    let adaptive = route_loader().get_adaptive().expect("synthesizes");
    let caller = Caller {
        url: Some(Url::parse("p://h?router=mesh&find.router=static").expect("valid url")),
    };

    // The method-scoped key wins for `find`; other methods fall back to the
    // plain parameter.
    let find = TestCall { method: "find".to_string() };
    assert_eq!(adaptive.dispatch(&caller, &find).expect("routes"), "static.find");
    let list = TestCall { method: "list".to_string() };
    assert_eq!(adaptive.dispatch(&caller, &list).expect("routes"), "mesh.list");
}

#[test]
fn adaptive_without_a_url_is_an_argument_error() {
    let adaptive = route_loader().get_adaptive().expect("synthesizes");
    let caller = Caller { url: None };
    let call = TestCall { method: "find".to_string() };
    assert!(matches!(
        adaptive.dispatch(&caller, &call).expect_err("no url"),
        ExtensionError::MissingUrl { .. }
    ));
}

#[test]
fn non_adaptive_methods_are_refused_by_the_stub() {
    let adaptive = route_loader().get_adaptive().expect("synthesizes");
    assert!(matches!(
        adaptive.reset().expect_err("not adaptive"),
        ExtensionError::UnsupportedOperation { method: "reset", .. }
    ));
    // Concrete implementations still answer.
    route_loader().get("static").expect("registered").reset().expect("concrete");
}

// =============================================================================
// Fixture: Naked (no adaptive hook, no default)
// =============================================================================

pub trait Naked: Extension {
    fn nothing(&self);
}

impl ExtensionPoint for dyn Naked {
    const TYPE_ID: &'static str = "alder.test.Naked";
    const TYPE_NAME: &'static str = "Naked";
    const DEFAULT: &'static str = "";
}

impl std::fmt::Debug for dyn Naked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Naked").finish()
    }
}

#[test]
fn points_without_an_adaptive_hook_refuse_synthesis() {
    let error = ExtensionLoader::<dyn Naked>::get_loader()
        .get_adaptive()
        .expect_err("no adaptive method");
    // First failure reports the refusal; later calls replay the memoized cause.
    assert!(matches!(
        error,
        ExtensionError::NoAdaptiveMethod { .. } | ExtensionError::AdaptiveCreation { .. }
    ));
    let again = ExtensionLoader::<dyn Naked>::get_loader()
        .get_adaptive()
        .expect_err("still refused");
    assert!(again.to_string().contains("no adaptive method"));
}

#[test]
fn true_without_a_default_is_an_error() {
    assert!(matches!(
        ExtensionLoader::<dyn Naked>::get_loader().get("true"),
        Err(ExtensionError::NoDefault { .. })
    ));
}

// =============================================================================
// Fixture: Doubled (more than one declared default)
// =============================================================================

pub trait Doubled: Extension {
    fn nothing(&self);
}

impl ExtensionPoint for dyn Doubled {
    const TYPE_ID: &'static str = "alder.test.Doubled";
    const TYPE_NAME: &'static str = "Doubled";
    const DEFAULT: &'static str = "a,b";
}

#[test]
fn declaring_two_defaults_is_fatal() {
    assert!(matches!(
        ExtensionLoader::<dyn Doubled>::get_loader().supported_names(),
        Err(ExtensionError::MultipleDefaults { .. })
    ));
}

// =============================================================================
// Fixture: Interceptor (activation)
// =============================================================================

pub trait Interceptor: Extension {
    fn label(&self) -> &'static str;
}

impl ExtensionPoint for dyn Interceptor {
    const TYPE_ID: &'static str = "alder.test.Interceptor";
    const TYPE_NAME: &'static str = "Interceptor";
    const DEFAULT: &'static str = "";
}

#[derive(Default)]
pub struct CacheInterceptor;
impl Extension for CacheInterceptor {}
impl Interceptor for CacheInterceptor {
    fn label(&self) -> &'static str {
        "cache"
    }
}

#[derive(Default)]
pub struct AccessLogInterceptor;
impl Extension for AccessLogInterceptor {}
impl Interceptor for AccessLogInterceptor {
    fn label(&self) -> &'static str {
        "accesslog"
    }
}

#[derive(Default)]
pub struct TailInterceptor;
impl Extension for TailInterceptor {}
impl Interceptor for TailInterceptor {
    fn label(&self) -> &'static str {
        "tail"
    }
}

submit_provider! {
    point: dyn Interceptor,
    impl_ref: "alder_fixtures::interceptor::CacheInterceptor",
    ordinary: CacheInterceptor,
    activate: ActivateMeta {
        groups: &["provider"],
        keys: &["cache"],
        before: &[],
        after: &[],
        order: 0,
    },
}
submit_provider! {
    point: dyn Interceptor,
    impl_ref: "alder_fixtures::interceptor::AccessLogInterceptor",
    ordinary: AccessLogInterceptor,
    activate: ActivateMeta {
        groups: &["consumer"],
        keys: &[],
        before: &[],
        after: &[],
        order: 0,
    },
}
submit_provider! {
    point: dyn Interceptor,
    impl_ref: "alder_fixtures::interceptor::TailInterceptor",
    ordinary: TailInterceptor,
}
submit_descriptor! {
    root: ALDER_DIRECTORY,
    type_id: "alder.test.Interceptor",
    contents: "cache=alder_fixtures::interceptor::CacheInterceptor\n\
               accesslog=alder_fixtures::interceptor::AccessLogInterceptor\n\
               tail=alder_fixtures::interceptor::TailInterceptor\n",
}

fn interceptor_loader() -> Arc<ExtensionLoader<dyn Interceptor>> {
    ExtensionLoader::<dyn Interceptor>::get_loader()
}

fn labels(extensions: &[Arc<dyn Interceptor>]) -> Vec<&'static str> {
    extensions.iter().map(|e| e.label()).collect()
}

#[test]
fn activation_matches_group_and_url_keys() {
    let url = Url::parse("p://h?cache=lru").expect("valid url");
    let active = interceptor_loader()
        .get_activate(&url, &["-accesslog"], Some("provider"))
        .expect("resolves");
    assert_eq!(labels(&active), vec!["cache"]);

    // Without the requested group every group matches; the explicit
    // removal still filters accesslog out.
    let active = interceptor_loader()
        .get_activate(&url, &["-accesslog"], None)
        .expect("resolves");
    assert_eq!(labels(&active), vec!["cache"]);
}

#[test]
fn activation_requires_a_matching_url_key() {
    let url = Url::parse("p://h").expect("valid url");
    let active = interceptor_loader()
        .get_activate(&url, &[], Some("provider"))
        .expect("resolves");
    assert!(active.is_empty());
}

#[test]
fn explicit_names_follow_the_implicit_batch() {
    let url = Url::parse("p://h?cache=lru").expect("valid url");
    let active = interceptor_loader()
        .get_activate(&url, &["tail"], Some("provider"))
        .expect("resolves");
    assert_eq!(labels(&active), vec!["cache", "tail"]);
}

#[test]
fn default_marker_positions_explicit_names_ahead() {
    let url = Url::parse("p://h?cache=lru").expect("valid url");
    let active = interceptor_loader()
        .get_activate(&url, &["tail", "default"], Some("provider"))
        .expect("resolves");
    assert_eq!(labels(&active), vec!["tail", "cache"]);
}

#[test]
fn minus_default_suppresses_implicit_activation() {
    let url = Url::parse("p://h?cache=lru").expect("valid url");
    let active = interceptor_loader()
        .get_activate(&url, &["-default", "tail"], Some("provider"))
        .expect("resolves");
    assert_eq!(labels(&active), vec!["tail"]);
}

#[test]
fn activation_list_can_come_from_a_url_parameter() {
    let url = Url::parse("p://h?cache=lru&interceptors=tail").expect("valid url");
    let active = interceptor_loader()
        .get_activate_by_key(&url, "interceptors", Some("provider"))
        .expect("resolves");
    assert_eq!(labels(&active), vec!["cache", "tail"]);
}

// =============================================================================
// Fixture: Audit (dependency injection through the shared factory)
// =============================================================================

pub trait Audit: Extension {
    fn check(&self, url: &Url) -> Result<String, ExtensionError>;
}

impl ExtensionPoint for dyn Audit {
    const TYPE_ID: &'static str = "alder.test.Audit";
    const TYPE_NAME: &'static str = "Audit";
    const DEFAULT: &'static str = "";
}

#[derive(Default)]
pub struct RouteAudit {
    route: OnceLock<Arc<dyn Route>>,
}
impl Extension for RouteAudit {
    fn inject(&self, factory: &dyn ExtensionFactory) -> Result<(), ExtensionError> {
        let route = inject_adaptive::<dyn Route>(factory, "route")?;
        let _ = self.route.set(route);
        Ok(())
    }
}
impl Audit for RouteAudit {
    fn check(&self, url: &Url) -> Result<String, ExtensionError> {
        match self.route.get() {
            Some(route) => Ok(format!("audit[{}]", route.route(url)?)),
            None => Ok("audit[uninjected]".to_string()),
        }
    }
}

submit_provider! {
    point: dyn Audit,
    impl_ref: "alder_fixtures::audit::RouteAudit",
    ordinary: RouteAudit,
}
submit_descriptor! {
    root: ALDER_DIRECTORY,
    type_id: "alder.test.Audit",
    contents: "route=alder_fixtures::audit::RouteAudit\n",
}

#[test]
fn injection_assigns_the_adaptive_stub_of_the_dependency() {
    let audit = ExtensionLoader::<dyn Audit>::get_loader()
        .get("route")
        .expect("registered");
    let url = Url::parse("mesh://host:20880/x").expect("valid url");
    assert_eq!(audit.check(&url).expect("routes"), "audit[mesh->host:20880]");
}

// =============================================================================
// Fixture: two points sharing one implementation type
// =============================================================================

static SHARED_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

pub trait PortA: Extension {
    fn serial_a(&self) -> usize;
}
pub trait PortB: Extension {
    fn serial_b(&self) -> usize;
}

impl ExtensionPoint for dyn PortA {
    const TYPE_ID: &'static str = "alder.test.PortA";
    const TYPE_NAME: &'static str = "PortA";
    const DEFAULT: &'static str = "";
}
impl ExtensionPoint for dyn PortB {
    const TYPE_ID: &'static str = "alder.test.PortB";
    const TYPE_NAME: &'static str = "PortB";
    const DEFAULT: &'static str = "";
}

pub struct SharedPort {
    serial: usize,
}
impl Default for SharedPort {
    fn default() -> Self {
        Self {
            serial: SHARED_CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst),
        }
    }
}
impl Extension for SharedPort {}
impl PortA for SharedPort {
    fn serial_a(&self) -> usize {
        self.serial
    }
}
impl PortB for SharedPort {
    fn serial_b(&self) -> usize {
        self.serial
    }
}

submit_provider! {
    point: dyn PortA,
    impl_ref: "alder_fixtures::shared::SharedPort",
    ordinary: SharedPort,
    name: "shared",
}
submit_provider! {
    point: dyn PortB,
    impl_ref: "alder_fixtures::shared::SharedPort",
    ordinary: SharedPort,
    name: "shared",
}
submit_descriptor! {
    root: ALDER_DIRECTORY,
    type_id: "alder.test.PortA",
    contents: "alder_fixtures::shared::SharedPort\n",
}
submit_descriptor! {
    root: ALDER_DIRECTORY,
    type_id: "alder.test.PortB",
    contents: "alder_fixtures::shared::SharedPort\n",
}

#[test]
fn points_sharing_an_implementation_share_the_bare_instance() {
    let a = ExtensionLoader::<dyn PortA>::get_loader().get("shared").expect("registered");
    let b = ExtensionLoader::<dyn PortB>::get_loader().get("shared").expect("registered");
    assert_eq!(a.serial_a(), b.serial_b());
    assert_eq!(SHARED_CONSTRUCTIONS.load(Ordering::SeqCst), 1);
}
