//! Link code for the configured endpoint.

use dl_config::LoggerConfig;
use dl_linkcode::{AddressSource, ConnectionDescriptor};

use crate::error::Result;

/// Descriptor advertising the configured port and path on every reachable
/// local address.
pub fn descriptor_for(config: &LoggerConfig, source: &dyn AddressSource) -> ConnectionDescriptor {
    ConnectionDescriptor::build(config.port, config.ingest_path.clone(), config.link_flags, source)
}

/// Text link code for `descriptor`, honouring `strict_link_code`.
pub fn link_code(config: &LoggerConfig, descriptor: &ConnectionDescriptor) -> Result<String> {
    if config.strict_link_code {
        Ok(descriptor.try_to_text()?)
    } else {
        Ok(descriptor.to_text())
    }
}
