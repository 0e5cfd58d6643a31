//! Validation of candidate client addresses pulled from the access log.
//!
//! Only addresses that a GeoIP database can place somewhere are accepted:
//! anything private, loopback, link-local or otherwise non-routable is
//! rejected up front so it never costs a lookup or a forecast call.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;

/// Why a candidate token did not make it into the address list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The log line has no field at the configured address position.
    #[error("line has {found} fields, address expected at index {index}")]
    MissingField { index: usize, found: usize },

    /// The token is not an IPv4 or IPv6 address.
    #[error("not a valid IP address")]
    Malformed,

    /// The address is well formed but cannot be geolocated.
    #[error("private or reserved address")]
    PrivateOrReserved,
}

/// Validates a single address token.
///
/// Leading and trailing whitespace is ignored. Documentation ranges such as
/// `203.0.113.0/24` are accepted; they are publicly routable as far as this
/// check is concerned.
///
/// # Examples
///
/// ```
/// use weather_histogram::{validate, RejectReason};
///
/// assert!(validate("203.0.113.5").is_ok());
/// assert_eq!(validate("10.0.0.1"), Err(RejectReason::PrivateOrReserved));
/// assert_eq!(validate("not-an-ip"), Err(RejectReason::Malformed));
/// ```
pub fn validate(token: &str) -> Result<IpAddr, RejectReason> {
    let address: IpAddr = token
        .trim()
        .parse()
        .map_err(|_| RejectReason::Malformed)?;

    if is_routable(&address) {
        Ok(address)
    } else {
        Err(RejectReason::PrivateOrReserved)
    }
}

fn is_routable(address: &IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => is_routable_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_routable_v4(&v4),
            None => is_routable_v6(v6),
        },
    }
}

fn is_routable_v4(address: &Ipv4Addr) -> bool {
    let [first, second, ..] = address.octets();
    // 100.64.0.0/10, carrier-grade NAT
    let shared = first == 100 && (second & 0b1100_0000) == 64;

    !(address.is_unspecified()
        || address.is_loopback()
        || address.is_private()
        || address.is_link_local()
        || address.is_broadcast()
        || address.is_multicast()
        || shared
        || first == 0)
}

fn is_routable_v6(address: &Ipv6Addr) -> bool {
    let first_segment = address.segments()[0];
    let unique_local = (first_segment & 0xfe00) == 0xfc00;
    let link_local = (first_segment & 0xffc0) == 0xfe80;

    !(address.is_unspecified()
        || address.is_loopback()
        || address.is_multicast()
        || unique_local
        || link_local)
}
