//! Local address discovery.
//!
//! The descriptor advertises the IPv4 addresses of every interface that is
//! up and not a loopback. Enumeration is behind [`AddressSource`] so the
//! descriptor can be built from a fixed list in tests.

use std::net::{IpAddr, Ipv4Addr};

use crate::error::DiscoveryError;

/// One address bound to a network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub interface: String,
    pub addr: IpAddr,
    pub up: bool,
    pub loopback: bool,
}

impl InterfaceAddr {
    /// IPv4 form of the address, if it has one.
    ///
    /// IPv4-mapped IPv6 addresses are reduced to IPv4.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match self.addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(v6) => v6.to_ipv4_mapped(),
        }
    }

    /// Whether the address should be advertised.
    pub fn is_reachable(&self) -> bool {
        self.up && !self.loopback
    }
}

/// Supplier of interface addresses.
pub trait AddressSource {
    /// Source name used for logs.
    fn name(&self) -> &str;
    /// List every address of every interface.
    fn interface_addrs(&self) -> Result<Vec<InterfaceAddr>, DiscoveryError>;
}

/// Addresses of the local host's network interfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAddressSource;

impl AddressSource for SystemAddressSource {
    fn name(&self) -> &str {
        "system"
    }

    #[cfg(unix)]
    fn interface_addrs(&self) -> Result<Vec<InterfaceAddr>, DiscoveryError> {
        unix::getifaddrs()
    }

    #[cfg(not(unix))]
    fn interface_addrs(&self) -> Result<Vec<InterfaceAddr>, DiscoveryError> {
        Err(DiscoveryError::Unsupported)
    }
}

/// A fixed list of addresses.
#[derive(Debug, Clone, Default)]
pub struct StaticAddressSource {
    addrs: Vec<InterfaceAddr>,
}

impl StaticAddressSource {
    pub fn new(addrs: Vec<InterfaceAddr>) -> Self {
        Self { addrs }
    }

    /// Up, non-loopback interfaces with the given addresses.
    pub fn from_ips(ips: impl IntoIterator<Item = IpAddr>) -> Self {
        let addrs = ips
            .into_iter()
            .enumerate()
            .map(|(i, addr)| InterfaceAddr {
                interface: format!("eth{i}"),
                addr,
                up: true,
                loopback: false,
            })
            .collect();
        Self { addrs }
    }
}

impl AddressSource for StaticAddressSource {
    fn name(&self) -> &str {
        "static"
    }

    fn interface_addrs(&self) -> Result<Vec<InterfaceAddr>, DiscoveryError> {
        Ok(self.addrs.clone())
    }
}

#[cfg(unix)]
mod unix {
    use std::ffi::CStr;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use super::InterfaceAddr;
    use crate::error::DiscoveryError;

    pub(super) fn getifaddrs() -> Result<Vec<InterfaceAddr>, DiscoveryError> {
        let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
        // SAFETY: `head` is a valid out-pointer; on success the list is
        // released with `freeifaddrs` below.
        if unsafe { libc::getifaddrs(&mut head) } != 0 {
            return Err(DiscoveryError::Enumerate(std::io::Error::last_os_error()));
        }

        let mut out = Vec::new();
        let mut cursor = head;
        while !cursor.is_null() {
            // SAFETY: `cursor` is a non-null node of the list returned by
            // getifaddrs, which stays alive until freeifaddrs.
            let ifa = unsafe { &*cursor };
            cursor = ifa.ifa_next;

            if ifa.ifa_addr.is_null() || ifa.ifa_name.is_null() {
                continue;
            }
            // SAFETY: checked non-null above; the kernel fills in a sockaddr
            // whose concrete type is given by sa_family.
            let addr = unsafe {
                match i32::from((*ifa.ifa_addr).sa_family) {
                    libc::AF_INET => {
                        let sin = &*(ifa.ifa_addr as *const libc::sockaddr_in);
                        IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)))
                    }
                    libc::AF_INET6 => {
                        let sin6 = &*(ifa.ifa_addr as *const libc::sockaddr_in6);
                        IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr))
                    }
                    _ => continue,
                }
            };
            // SAFETY: ifa_name is a NUL-terminated string owned by the list.
            let interface = unsafe { CStr::from_ptr(ifa.ifa_name) }
                .to_string_lossy()
                .into_owned();
            let flags = ifa.ifa_flags as libc::c_int;

            out.push(InterfaceAddr {
                interface,
                addr,
                up: flags & libc::IFF_UP != 0,
                loopback: flags & libc::IFF_LOOPBACK != 0,
            });
        }

        // SAFETY: `head` came from a successful getifaddrs call.
        unsafe { libc::freeifaddrs(head) };
        Ok(out)
    }
}
