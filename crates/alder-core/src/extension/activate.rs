//! Conditional activation of extensions.
//!
//! Activation metadata rides on provider records: a group set restricting
//! where the extension applies, URL-key predicates gating it on request
//! parameters, and ordering hints. [`ExtensionLoader::get_activate`]
//! combines the implicit matches with an explicit name list.
//!
//! [`ExtensionLoader::get_activate`]: super::ExtensionLoader::get_activate

use std::cmp::Ordering;

use crate::url::Url;

/// Activation metadata for one implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivateMeta {
    /// Groups the extension belongs to; empty matches every requested group.
    pub groups: &'static [&'static str],
    /// URL parameter keys that enable the extension; empty means always
    /// active within a matching group.
    pub keys: &'static [&'static str],
    /// Names this extension must sort before.
    pub before: &'static [&'static str],
    /// Names this extension must sort after.
    pub after: &'static [&'static str],
    /// Coarse ordering weight; lower sorts first.
    pub order: i32,
}

impl ActivateMeta {
    /// Metadata with no constraints: every group, always active, default
    /// order.
    pub const DEFAULT: ActivateMeta = ActivateMeta {
        groups: &[],
        keys: &[],
        before: &[],
        after: &[],
        order: 0,
    };
}

impl Default for ActivateMeta {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Does the metadata's group set admit the requested group? An absent or
/// empty request matches everything.
pub(crate) fn group_matches(requested: Option<&str>, meta: &ActivateMeta) -> bool {
    match requested {
        None | Some("") => true,
        Some(group) => meta.groups.contains(&group),
    }
}

/// Does the URL satisfy the metadata's key predicates? With no keys the
/// extension is unconditionally active; otherwise some key `k` must appear
/// as a parameter named `k` or `*.k` with a non-empty value.
pub(crate) fn url_matches(url: &Url, meta: &ActivateMeta) -> bool {
    if meta.keys.is_empty() {
        return true;
    }
    meta.keys.iter().any(|key| {
        url.parameters().iter().any(|(param, value)| {
            (param == key || param.ends_with(&format!(".{key}"))) && !value.is_empty()
        })
    })
}

/// Total order over activated extensions: before/after hints first, then the
/// numeric order, then the name as a stable tie-break.
pub(crate) fn compare(
    (name_a, meta_a): (&str, &ActivateMeta),
    (name_b, meta_b): (&str, &ActivateMeta),
) -> Ordering {
    if meta_a.before.contains(&name_b) || meta_b.after.contains(&name_a) {
        return Ordering::Less;
    }
    if meta_a.after.contains(&name_b) || meta_b.before.contains(&name_a) {
        return Ordering::Greater;
    }
    meta_a.order.cmp(&meta_b.order).then_with(|| name_a.cmp(name_b))
}
