//! IPv4 syntax gate.

use std::net::Ipv4Addr;

/// Whether `s` is a dotted-quad IPv4 address.
///
/// Leading zeros, surrounding whitespace and short forms (`10.1`) are
/// rejected.
pub fn is_valid_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}
