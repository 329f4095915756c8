//! Sprout data logger link codes.
//!
//! A link code is a compact description of how a device can reach the
//! ingestion endpoint: a small binary descriptor (addresses, port, path and
//! protocol flags) rendered as standard Base64.
//!
//! This crate provides:
//! - Protocol flag packing (`flags`)
//! - Local address discovery (`discovery`)
//! - The descriptor and its binary/text codec (`descriptor`)

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod flags;

pub use descriptor::{ConnectionDescriptor, HEADER_LEN, PROTOCOL_VERSION};
pub use discovery::{AddressSource, InterfaceAddr, StaticAddressSource, SystemAddressSource};
pub use error::{DescriptorError, DiscoveryError};
pub use flags::{Encoding, Framing, LinkFlags, TlsMode};
