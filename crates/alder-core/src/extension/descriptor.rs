//! Descriptor file discovery and parsing.
//!
//! A descriptor file is named after an extension point's type id and lives
//! under one of three roots (internal, user, legacy services). Each
//! non-comment line is `name[,name]*=impl-ref` or a bare `impl-ref` whose
//! name is inferred later. Files come from two sources: descriptors embedded
//! at link time via [`submit_descriptor!`], and filesystem roots listed in
//! the `ALDER_DESCRIPTOR_PATH` environment variable so deployments can add
//! or override extensions without rebuilding.

use std::path::Path;

use tracing::warn;

use crate::constants::DESCRIPTOR_PATH_ENV;

/// A descriptor file embedded into the binary by an implementation crate.
pub struct DescriptorSource {
    /// Search root the file belongs to (one of the `*_DIRECTORY` constants).
    pub root: &'static str,
    /// Extension point type id; doubles as the file name.
    pub type_id: &'static str,
    /// UTF-8 file contents.
    pub contents: &'static str,
    /// Human-readable origin for diagnostics.
    pub origin: &'static str,
}

inventory::collect!(DescriptorSource);

/// Embed a descriptor file for an extension point.
#[macro_export]
macro_rules! submit_descriptor {
    (root: $root:expr, type_id: $type_id:literal, contents: $contents:expr $(,)?) => {
        $crate::inventory::submit! {
            $crate::extension::descriptor::DescriptorSource {
                root: $root,
                type_id: $type_id,
                contents: $contents,
                origin: concat!("embedded:", env!("CARGO_PKG_NAME")),
            }
        }
    };
}

/// One resolved descriptor file, ready to parse.
#[derive(Debug, Clone)]
pub struct DescriptorResource {
    pub origin: String,
    pub contents: String,
}

/// One parsed descriptor entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorLine {
    /// Explicit name list text (`a` or `a,b`), absent for bare refs.
    pub name: Option<String>,
    /// Implementation reference.
    pub impl_ref: String,
    /// The trimmed source line, used to key load-error records.
    pub text: String,
    /// Origin of the containing file.
    pub origin: String,
}

/// Collect every descriptor resource for `root`/`type_id`: embedded sources
/// first, then filesystem roots in `ALDER_DESCRIPTOR_PATH` order. Unreadable
/// files are logged and skipped so one bad root cannot poison loading.
pub fn resources_for(root: &str, type_id: &str) -> Vec<DescriptorResource> {
    let mut resources: Vec<DescriptorResource> = inventory::iter::<DescriptorSource>
        .into_iter()
        .filter(|source| source.root == root && source.type_id == type_id)
        .map(|source| DescriptorResource {
            origin: source.origin.to_string(),
            contents: source.contents.to_string(),
        })
        .collect();

    if let Ok(paths) = std::env::var(DESCRIPTOR_PATH_ENV) {
        for base in paths.split(':').filter(|p| !p.is_empty()) {
            let path = Path::new(base).join(root).join(type_id);
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(contents) => resources.push(DescriptorResource {
                    origin: path.display().to_string(),
                    contents,
                }),
                Err(error) => {
                    warn!(path = %path.display(), %error, "failed to read descriptor file");
                }
            }
        }
    }

    resources
}

/// Parse the entries of one descriptor file. Comments (`#` to end of line)
/// and blank lines are dropped; malformed entries (an `=` with nothing after
/// it) are dropped here and surface as "unknown reference" only if some
/// other file names them.
pub fn parse(resource: &DescriptorResource) -> Vec<DescriptorLine> {
    let mut lines = Vec::new();
    for raw in resource.contents.lines() {
        let line = match raw.find('#') {
            Some(i) => &raw[..i],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (name, impl_ref) = match line.split_once('=') {
            Some((name, impl_ref)) => (Some(name.trim().to_string()), impl_ref.trim()),
            None => (None, line),
        };
        if impl_ref.is_empty() {
            continue;
        }

        lines.push(DescriptorLine {
            name: name.filter(|n| !n.is_empty()),
            impl_ref: impl_ref.to_string(),
            text: line.to_string(),
            origin: resource.origin.clone(),
        });
    }
    lines
}

/// Infer an extension name from an implementation reference: the short type
/// name (after the last path segment) minus the point's short-name suffix,
/// lowercased. `my_crate::cache::LruCache` for point `Cache` infers `lru`.
pub fn infer_name(impl_ref: &str, type_name: &str) -> Option<String> {
    let short = impl_ref.rsplit("::").next().unwrap_or(impl_ref);
    let short = short.rsplit('.').next().unwrap_or(short);
    if short.len() > type_name.len() && short.ends_with(type_name) {
        Some(short[..short.len() - type_name.len()].to_lowercase())
    } else {
        None
    }
}
