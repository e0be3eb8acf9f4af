//! Serializer selection.
//!
//! Outbound frames pick the serializer by the URL's `serialization`
//! parameter; inbound frames carry the serializer id in the header, which is
//! mapped back to a name through a table scanned once from the registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use snafu::ResultExt;
use tracing::warn;

use alder_core::extension::ExtensionLoader;
use alder_core::Url;

use crate::constants::DEFAULT_SERIALIZATION;
use crate::constants::SERIALIZATION_KEY;
use crate::error::{self, CodecError};
use crate::serialize::Serialization;

fn serialization_loader() -> Arc<ExtensionLoader<dyn Serialization>> {
    ExtensionLoader::<dyn Serialization>::get_loader()
}

/// Serializer for an outbound frame: the URL's `serialization` parameter,
/// falling back to the default format.
pub fn get_serialization(url: &Url) -> Result<Arc<dyn Serialization>, CodecError> {
    let name = url.parameter_or(SERIALIZATION_KEY, DEFAULT_SERIALIZATION);
    serialization_loader().get(name).context(error::ExtensionSnafu)
}

/// Serializer for an inbound frame, by the id carried in the header flags.
pub fn serialization_by_id(id: u8) -> Result<Arc<dyn Serialization>, CodecError> {
    let name = id_table()
        .get(&id)
        .ok_or_else(|| error::UnknownSerializationSnafu { id }.build())?;
    serialization_loader().get(name).context(error::ExtensionSnafu)
}

/// id → name table, built by scanning every registered serialization once.
/// Registered after-the-fact serializations (tests, dynamic `add`) are not
/// re-scanned; ids are a link-time property in practice.
fn id_table() -> &'static HashMap<u8, String> {
    static TABLE: OnceLock<HashMap<u8, String>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let loader = serialization_loader();
        let mut table = HashMap::new();
        for name in loader.supported_names().unwrap_or_default() {
            let serialization = match loader.get(&name) {
                Ok(serialization) => serialization,
                Err(err) => {
                    warn!(serialization = %name, error = %err, "skipping unusable serialization");
                    continue;
                }
            };
            let id = serialization.content_type_id();
            if let Some(existing) = table.insert(id, name.clone()) {
                warn!(
                    id,
                    first = %existing,
                    second = %name,
                    "duplicate serialization id, keeping the later registration"
                );
            }
        }
        table
    })
}
