//! Adaptive dispatch plans.
//!
//! An adaptive stub implements an extension point by reading an extension
//! name out of the per-call URL and delegating to the implementation
//! registered under that name. The name resolution (an ordered key list
//! walked right to left with the registry default as the seed) is identical
//! for every point, so it lives here as a precomputed [`AdaptivePlan`];
//! each point's stub owns a plan plus the point-specific URL extraction.

use std::sync::Arc;

use super::error::{self, ExtensionError};
use super::loader::ExtensionLoader;
use super::ExtensionPoint;
use crate::url::Url;

/// Pseudo-key resolved from the URL scheme instead of a parameter lookup.
const PROTOCOL_KEY: &str = "protocol";

/// A method-call payload that adaptive dispatch can take a method name from,
/// enabling method-scoped parameter lookups (`<method>.<key>`).
pub trait Invocation {
    fn method_name(&self) -> &str;
}

/// Precomputed selection plan for the adaptive methods of one extension
/// point: the ordered URL keys and the registry's default name.
#[derive(Debug, Clone)]
pub struct AdaptivePlan {
    point: &'static str,
    keys: Vec<String>,
    default_name: Option<String>,
}

impl AdaptivePlan {
    /// Build the plan for a point. `keys` is the declared key sequence; when
    /// empty, the single key is derived from the point's type name
    /// (`LoadBalance` derives `load.balance`). The default name is read from
    /// the point's loaded descriptor table.
    pub fn for_point<P: ExtensionPoint + ?Sized>(
        loader: &ExtensionLoader<P>,
        keys: &[&str],
    ) -> Result<Self, ExtensionError> {
        let keys = if keys.is_empty() {
            vec![derive_key(P::TYPE_NAME)]
        } else {
            keys.iter().map(|k| k.to_string()).collect()
        };
        Ok(Self {
            point: P::TYPE_ID,
            keys,
            default_name: loader.default_name()?,
        })
    }

    /// Declared key sequence.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Resolve the extension name for one call.
    ///
    /// The keys are folded right to left: each key reads the URL (the
    /// method-scoped parameter when `method` is present) and falls back to
    /// the value accumulated from the keys to its right, seeded with the
    /// registry default. The `protocol` pseudo-key reads the URL scheme.
    pub fn resolve(&self, url: &Url, method: Option<&str>) -> Result<String, ExtensionError> {
        let mut resolved = self.default_name.clone();
        for key in self.keys.iter().rev() {
            let value = if key == PROTOCOL_KEY {
                non_empty(Some(url.protocol()))
            } else if let Some(method) = method {
                non_empty(url.method_parameter(method, key))
            } else {
                non_empty(url.parameter(key))
            };
            if let Some(value) = value {
                resolved = Some(value);
            }
        }
        resolved.ok_or_else(|| {
            error::NoExtensionNameSnafu {
                type_id: self.point,
                url: url.to_string(),
                keys: self.keys.clone(),
            }
            .build()
        })
    }

    /// Resolve the name and fetch the implementation in one step.
    pub fn select<P: ExtensionPoint + ?Sized>(
        &self,
        loader: &ExtensionLoader<P>,
        url: &Url,
        method: Option<&str>,
    ) -> Result<Arc<P>, ExtensionError> {
        let name = self.resolve(url, method)?;
        loader.get(&name)
    }
}

/// Guard for adaptive call sites that extract their URL from an argument:
/// absent URLs are an argument error, not a dispatch failure.
pub fn require_url<'a, P: ExtensionPoint + ?Sized>(
    url: Option<&'a Url>,
) -> Result<&'a Url, ExtensionError> {
    url.ok_or_else(|| error::MissingUrlSnafu { type_id: P::TYPE_ID }.build())
}

/// Derive the default URL key from a point's type name by splitting on case
/// boundaries: `LoadBalance` becomes `load.balance`.
fn derive_key(type_name: &str) -> String {
    let mut key = String::with_capacity(type_name.len() + 4);
    for (i, c) in type_name.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                key.push('.');
            }
            key.extend(c.to_lowercase());
        } else {
            key.push(c);
        }
    }
    key
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
