//! Protocol flags carried in the descriptor's flags byte.
//!
//! ```text
//! 1....... = LAN transport
//! .r...... = reserved, must be zero
//! ..cc.... = encoding
//! ....ff.. = framing
//! ......ee = encryption
//! ```

use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;

const TLS_MASK: u8 = 0x03;
const FRAMING_MASK: u8 = 0x0c;
const ENCODING_MASK: u8 = 0x30;
const RESERVED_MASK: u8 = 0x40;
const LAN_TRANSPORT: u8 = 0x80;

/// Transport encryption advertised to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    #[default]
    None,
    Kudzu,
    Any,
}

/// How samples are framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    Raw,
    #[default]
    HttpRaw,
    HttpJson,
}

/// How sample payloads are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Raw,
    Cayenne,
    #[default]
    Json,
}

/// The full set of protocol flags.
///
/// The default is what the HTTP ingestion endpoint speaks: no TLS, raw
/// HTTP framing, JSON payloads, LAN transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkFlags {
    pub tls: TlsMode,
    pub framing: Framing,
    pub encoding: Encoding,
    pub lan_transport: bool,
}

impl Default for LinkFlags {
    fn default() -> Self {
        Self {
            tls: TlsMode::None,
            framing: Framing::HttpRaw,
            encoding: Encoding::Json,
            lan_transport: true,
        }
    }
}

impl LinkFlags {
    /// Pack into the wire byte.
    pub fn to_byte(self) -> u8 {
        let tls = match self.tls {
            TlsMode::None => 0x00,
            TlsMode::Kudzu => 0x01,
            TlsMode::Any => 0x02,
        };
        let framing = match self.framing {
            Framing::Raw => 0x00,
            Framing::HttpRaw => 0x04,
            Framing::HttpJson => 0x08,
        };
        let encoding = match self.encoding {
            Encoding::Raw => 0x00,
            Encoding::Cayenne => 0x10,
            Encoding::Json => 0x20,
        };
        let transport = if self.lan_transport { LAN_TRANSPORT } else { 0 };
        tls | framing | encoding | transport
    }

    /// Unpack a wire byte, rejecting unassigned bit patterns.
    pub fn from_byte(byte: u8) -> Result<Self, DescriptorError> {
        let tls = match byte & TLS_MASK {
            0x00 => TlsMode::None,
            0x01 => TlsMode::Kudzu,
            0x02 => TlsMode::Any,
            _ => return Err(DescriptorError::InvalidFlags(byte)),
        };
        let framing = match byte & FRAMING_MASK {
            0x00 => Framing::Raw,
            0x04 => Framing::HttpRaw,
            0x08 => Framing::HttpJson,
            _ => return Err(DescriptorError::InvalidFlags(byte)),
        };
        let encoding = match byte & ENCODING_MASK {
            0x00 => Encoding::Raw,
            0x10 => Encoding::Cayenne,
            0x20 => Encoding::Json,
            _ => return Err(DescriptorError::InvalidFlags(byte)),
        };
        if byte & RESERVED_MASK != 0 {
            return Err(DescriptorError::InvalidFlags(byte));
        }
        Ok(Self {
            tls,
            framing,
            encoding,
            lan_transport: byte & LAN_TRANSPORT != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_byte() {
        // none | http raw | json | lan
        assert_eq!(LinkFlags::default().to_byte(), 0xa4);
    }

    #[test]
    fn every_valid_combination_unpacks_to_itself() {
        for tls in [TlsMode::None, TlsMode::Kudzu, TlsMode::Any] {
            for framing in [Framing::Raw, Framing::HttpRaw, Framing::HttpJson] {
                for encoding in [Encoding::Raw, Encoding::Cayenne, Encoding::Json] {
                    for lan_transport in [false, true] {
                        let flags = LinkFlags {
                            tls,
                            framing,
                            encoding,
                            lan_transport,
                        };
                        assert_eq!(LinkFlags::from_byte(flags.to_byte()).unwrap(), flags);
                    }
                }
            }
        }
    }

    #[test]
    fn unassigned_patterns_are_rejected() {
        for byte in [0x03, 0x0c, 0x30, 0x40] {
            assert!(matches!(
                LinkFlags::from_byte(byte),
                Err(DescriptorError::InvalidFlags(b)) if b == byte
            ));
        }
    }

    #[test]
    fn flags_deserialize_with_defaults() {
        let flags: LinkFlags = serde_json::from_str(r#"{"tls": "kudzu"}"#).unwrap();
        assert_eq!(flags.tls, TlsMode::Kudzu);
        assert_eq!(flags.framing, Framing::HttpRaw);
        assert!(flags.lan_transport);
    }
}
