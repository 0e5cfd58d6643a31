//! Resolves client addresses to coordinates.

use crate::location::error::LocateError;
use crate::report::StepSummary;
use log::{info, warn};
use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::net::IpAddr;
use std::path::Path;
use std::time::Instant;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use weather_histogram::LatLon;
///
/// let berlin_center = LatLon(52.5200, 13.4050);
/// assert_eq!(berlin_center.0, 52.5200); // Latitude
/// assert_eq!(berlin_center.1, 13.4050); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// A validated client address together with the place it resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    pub address: IpAddr,
    pub location: LatLon,
}

/// Anything that can place an IP address on the map.
pub trait LocationResolver {
    fn locate(&self, address: IpAddr) -> Result<LatLon, LocateError>;
}

/// Lookups against a local MaxMind GeoLite2 City database.
pub struct GeoIpResolver {
    reader: Reader<Vec<u8>>,
}

impl GeoIpResolver {
    /// Loads the `.mmdb` file into memory.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::DatabaseOpen`] when the file is missing or is not
    /// a MaxMind database.
    pub fn open(path: &Path) -> Result<Self, LocateError> {
        let reader = Reader::open_readfile(path)
            .map_err(|e| LocateError::DatabaseOpen(path.to_path_buf(), e))?;
        info!(
            "Opened GeoIP database {} ({})",
            path.display(),
            reader.metadata.database_type
        );
        Ok(Self { reader })
    }
}

impl LocationResolver for GeoIpResolver {
    fn locate(&self, address: IpAddr) -> Result<LatLon, LocateError> {
        let city: geoip2::City = self.reader.lookup(address).map_err(|e| match e {
            MaxMindDBError::AddressNotFoundError(_) => LocateError::AddressNotFound(address),
            other => LocateError::Lookup(address, other),
        })?;

        city.location
            .and_then(|location| location.latitude.zip(location.longitude))
            .map(|(latitude, longitude)| LatLon(latitude, longitude))
            .ok_or(LocateError::MissingCoordinates(address))
    }
}

/// Output of the location stage.
#[derive(Debug, Clone)]
pub struct LocatedAddresses {
    pub located: Vec<Located>,
    pub summary: StepSummary,
}

/// Resolves every address in order. Addresses that cannot be placed are
/// logged, counted and skipped.
pub fn locate_all<R: LocationResolver + ?Sized>(
    resolver: &R,
    addresses: &[IpAddr],
) -> LocatedAddresses {
    let started = Instant::now();
    let mut located = Vec::with_capacity(addresses.len());
    let mut failures = 0;

    for &address in addresses {
        match resolver.locate(address) {
            Ok(location) => located.push(Located { address, location }),
            Err(e) => {
                failures += 1;
                warn!("{}. Skipping location...", e);
            }
        }
    }

    let summary = StepSummary::new(
        "Looking Up Locations In Local Location DB",
        "Locations Lookup DB",
        addresses.len(),
        failures,
        started.elapsed(),
    );
    LocatedAddresses { located, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TableResolver(HashMap<IpAddr, LatLon>);

    impl LocationResolver for TableResolver {
        fn locate(&self, address: IpAddr) -> Result<LatLon, LocateError> {
            self.0
                .get(&address)
                .copied()
                .ok_or(LocateError::AddressNotFound(address))
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn unknown_addresses_are_counted_and_skipped() {
        let resolver = TableResolver(HashMap::from([
            (ip("8.8.8.8"), LatLon(37.751, -97.822)),
            (ip("1.1.1.1"), LatLon(-33.494, 143.2104)),
        ]));
        let addresses = [ip("8.8.8.8"), ip("9.9.9.9"), ip("1.1.1.1"), ip("8.8.8.8")];

        let result = locate_all(&resolver, &addresses);

        assert_eq!(result.located.len(), 3);
        assert_eq!(result.located[1].address, ip("1.1.1.1"));
        assert_eq!(result.located[2].location, LatLon(37.751, -97.822));
        assert_eq!(result.summary.attempted, 4);
        assert_eq!(result.summary.failures, 1);
    }

    #[test]
    fn opening_a_missing_database_fails() {
        let result = GeoIpResolver::open(Path::new("/no/such/GeoLite2-City.mmdb"));
        assert!(matches!(result, Err(LocateError::DatabaseOpen(_, _))));
    }
}
