//! Shared constants for extension resolution.
//!
//! Constants are fixed and immutable, enforced at compile time. Descriptor
//! search roots mirror the classic service-provider layout so operators can
//! drop override files next to the binary without rebuilding.

/// Descriptor root for extensions shipped by alder itself.
pub const INTERNAL_DIRECTORY: &str = "META-INF/alder/internal/";

/// Descriptor root for user-provided extensions.
pub const ALDER_DIRECTORY: &str = "META-INF/alder/";

/// Legacy service-provider root, searched last.
pub const SERVICES_DIRECTORY: &str = "META-INF/services/";

/// Environment variable naming extra filesystem roots for descriptor files,
/// `:`-separated. Each entry is a directory that is searched for
/// `<root>/<type-id>` files in addition to the embedded descriptors.
pub const DESCRIPTOR_PATH_ENV: &str = "ALDER_DESCRIPTOR_PATH";

/// Extension name that resolves to the registry's configured default.
pub const TRUE_VALUE: &str = "true";

/// Placeholder name marking the implicit activation batch in an explicit
/// activation list.
pub const DEFAULT_KEY: &str = "default";

/// Prefix that removes an extension name from an activation list.
pub const REMOVE_VALUE_PREFIX: &str = "-";

/// Split a comma-separated name list, trimming whitespace and dropping
/// empty segments.
pub fn comma_split(value: &str) -> Vec<&str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}
