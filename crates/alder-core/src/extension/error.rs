//! Errors from extension resolution.
//!
//! Load-time problems (bad descriptor lines, missing provider records) are
//! *collected* per line rather than raised, so unrelated extensions stay
//! usable; the collected causes surface later inside [`ExtensionError::NotFound`]
//! digests. Per-call problems are returned synchronously.

use snafu::Snafu;

/// Errors surfaced by [`ExtensionLoader`](super::ExtensionLoader) operations.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ExtensionError {
    /// A lookup was attempted with an empty name.
    #[snafu(display("extension name must not be empty (extension point {type_id})"))]
    EmptyName { type_id: &'static str },

    /// No extension is registered under the requested name. The digest
    /// aggregates every load-time failure whose descriptor line matches the
    /// name case-insensitively.
    #[snafu(display("{digest}"))]
    NotFound {
        type_id: &'static str,
        name: String,
        digest: String,
    },

    /// `"true"` was requested but the point declares no default.
    #[snafu(display("no default extension configured for {type_id}"))]
    NoDefault { type_id: &'static str },

    /// The point declaration names more than one default.
    #[snafu(display("more than one default extension name on {type_id}: {names:?}"))]
    MultipleDefaults {
        type_id: &'static str,
        names: Vec<String>,
    },

    /// Constructing or composing an instance failed.
    #[snafu(display("extension {name} of {type_id} could not be instantiated: {reason}"))]
    Instantiation {
        type_id: &'static str,
        name: String,
        reason: String,
    },

    /// The point has no adaptive hook and no author-provided adaptive
    /// implementation.
    #[snafu(display("no adaptive method on extension {type_id}, refuse to create the adaptive instance"))]
    NoAdaptiveMethod { type_id: &'static str },

    /// Adaptive construction failed; the failure is memoized so repeated
    /// calls report the original cause.
    #[snafu(display("fail to create adaptive instance for {type_id}: {message}"))]
    AdaptiveCreation {
        type_id: &'static str,
        message: String,
    },

    /// An adaptive call site could not produce a URL.
    #[snafu(display("url == null when dispatching adaptive extension {type_id}"))]
    MissingUrl { type_id: &'static str },

    /// The adaptive key walk produced no extension name.
    #[snafu(display("Fail to get extension({type_id}) name from url({url}) use keys({keys:?})"))]
    NoExtensionName {
        type_id: &'static str,
        url: String,
        keys: Vec<String>,
    },

    /// A non-adaptive method was invoked on an adaptive stub.
    #[snafu(display("method {method} of {type_id} is not an adaptive method"))]
    UnsupportedOperation {
        type_id: &'static str,
        method: &'static str,
    },

    /// Programmatic registration under an already-taken name.
    #[snafu(display("extension name {name} already registered for {type_id}"))]
    NameExists {
        type_id: &'static str,
        name: String,
    },

    /// Programmatic replacement of a name that was never registered.
    #[snafu(display("extension name {name} is not registered for {type_id}"))]
    NameMissing {
        type_id: &'static str,
        name: String,
    },

    /// Programmatic registration of a second adaptive implementation.
    #[snafu(display("adaptive extension already registered for {type_id}"))]
    AdaptiveExists { type_id: &'static str },

    /// Programmatic replacement of an adaptive implementation that does not
    /// exist.
    #[snafu(display("adaptive extension is not registered for {type_id}"))]
    AdaptiveMissing { type_id: &'static str },

    /// A dependency could not be resolved during injection. Loaders log
    /// this and return the instance anyway; `inject` implementations may
    /// also surface it directly.
    #[snafu(display("failed to inject dependency '{property}' of extension point {point}"))]
    Injection {
        point: &'static str,
        property: String,
    },
}
