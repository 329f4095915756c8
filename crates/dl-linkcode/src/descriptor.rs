//! Connection descriptor and its binary/text codec.
//!
//! Wire layout, multi-byte fields little-endian:
//!
//! | offset        | size      | field                        |
//! |---------------|-----------|------------------------------|
//! | 0             | 1         | protocol version (1)         |
//! | 1             | 1         | address count                |
//! | 2             | 1         | path length in bytes         |
//! | 3             | 1         | flags (see [`crate::flags`]) |
//! | 4             | 2         | port                         |
//! | 6             | 4 × count | IPv4 addresses               |
//! | 6 + 4 × count | path len  | path bytes                   |
//!
//! The count and length fields are single bytes. [`ConnectionDescriptor::serialize`]
//! writes them modulo 256 while still emitting every address and path
//! byte, so a descriptor with more than 255 addresses or a path longer
//! than 255 bytes produces a header that disagrees with its payload.
//! [`ConnectionDescriptor::try_serialize`] refuses such descriptors instead.

use std::net::Ipv4Addr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use tracing::{debug, warn};

use crate::discovery::AddressSource;
use crate::error::DescriptorError;
use crate::flags::LinkFlags;

/// Protocol version written in the first byte.
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of the fixed header: version, count, path length, flags, port.
pub const HEADER_LEN: usize = 6;

/// Largest value a one-byte count or length field can hold.
const MAX_FIELD_LEN: usize = u8::MAX as usize;

/// How a device can reach the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionDescriptor {
    pub port: u16,
    pub path: String,
    pub addresses: Vec<Ipv4Addr>,
    pub lan_mode: bool,
    pub flags: LinkFlags,
}

impl ConnectionDescriptor {
    /// Create a descriptor with no addresses.
    ///
    /// LAN mode follows the LAN transport bit of `flags`.
    pub fn new(port: u16, path: impl Into<String>, flags: LinkFlags) -> Self {
        Self {
            port,
            path: path.into(),
            addresses: Vec::new(),
            lan_mode: flags.lan_transport,
            flags,
        }
    }

    /// Create a descriptor advertising every reachable IPv4 address of
    /// `source`.
    ///
    /// Enumeration failures are logged and leave the address list empty.
    pub fn build(
        port: u16,
        path: impl Into<String>,
        flags: LinkFlags,
        source: &dyn AddressSource,
    ) -> Self {
        let mut descriptor = Self::new(port, path, flags);

        match source.interface_addrs() {
            Ok(addrs) => {
                descriptor.addresses = addrs
                    .iter()
                    .filter(|a| a.is_reachable())
                    .filter_map(|a| a.ipv4())
                    .collect();
                debug!(
                    source = source.name(),
                    found = addrs.len(),
                    advertised = descriptor.addresses.len(),
                    "interface addresses collected"
                );
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "address discovery failed");
            }
        }

        descriptor
    }

    /// Length of the serialized form.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + 4 * self.addresses.len() + self.path.len()
    }

    /// Serialize to the wire layout.
    ///
    /// Counts above 255 wrap in the header; see the module documentation.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(PROTOCOL_VERSION);
        out.push(self.addresses.len() as u8);
        out.push(self.path.len() as u8);
        out.push(self.flags.to_byte());
        out.extend_from_slice(&self.port.to_le_bytes());
        for addr in &self.addresses {
            out.extend_from_slice(&addr.octets());
        }
        out.extend_from_slice(self.path.as_bytes());
        out
    }

    /// Serialize, refusing descriptors whose counts do not fit one byte.
    pub fn try_serialize(&self) -> Result<Vec<u8>, DescriptorError> {
        self.check_capacity()?;
        Ok(self.serialize())
    }

    /// Standard Base64 (padded) of [`Self::serialize`].
    pub fn to_text(&self) -> String {
        BASE64.encode(self.serialize())
    }

    /// Standard Base64 (padded) of [`Self::try_serialize`].
    pub fn try_to_text(&self) -> Result<String, DescriptorError> {
        Ok(BASE64.encode(self.try_serialize()?))
    }

    /// Check that address count and path length fit their header fields.
    pub fn check_capacity(&self) -> Result<(), DescriptorError> {
        if self.addresses.len() > MAX_FIELD_LEN {
            return Err(DescriptorError::CapacityExceeded {
                field: "address count",
                len: self.addresses.len(),
            });
        }
        if self.path.len() > MAX_FIELD_LEN {
            return Err(DescriptorError::CapacityExceeded {
                field: "path length",
                len: self.path.len(),
            });
        }
        Ok(())
    }

    /// Decode the wire layout.
    ///
    /// The payload must be exactly as long as the header declares.
    pub fn decode(bytes: &[u8]) -> Result<Self, DescriptorError> {
        if bytes.len() < HEADER_LEN {
            return Err(DescriptorError::Truncated {
                len: bytes.len(),
                needed: HEADER_LEN,
            });
        }
        if bytes[0] != PROTOCOL_VERSION {
            return Err(DescriptorError::UnsupportedVersion(bytes[0]));
        }

        let count = usize::from(bytes[1]);
        let path_len = usize::from(bytes[2]);
        let flags = LinkFlags::from_byte(bytes[3])?;
        let port = u16::from_le_bytes([bytes[4], bytes[5]]);

        let expected = HEADER_LEN + 4 * count + path_len;
        if bytes.len() != expected {
            return Err(DescriptorError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let (addr_bytes, path_bytes) = bytes[HEADER_LEN..].split_at(4 * count);
        let addresses = addr_bytes
            .chunks_exact(4)
            .map(|c| Ipv4Addr::new(c[0], c[1], c[2], c[3]))
            .collect();
        let path = std::str::from_utf8(path_bytes)
            .map_err(|_| DescriptorError::InvalidPath)?
            .to_string();

        Ok(Self {
            port,
            path,
            addresses,
            lan_mode: flags.lan_transport,
            flags,
        })
    }

    /// Decode a link code.
    pub fn from_text(code: &str) -> Result<Self, DescriptorError> {
        let bytes = BASE64.decode(code.trim())?;
        Self::decode(&bytes)
    }
}
