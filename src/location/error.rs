use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Failed to open GeoIP database '{0}'")]
    DatabaseOpen(PathBuf, #[source] maxminddb::MaxMindDBError),

    #[error("Address {0} not found in GeoIP database")]
    AddressNotFound(IpAddr),

    #[error("GeoIP record for {0} has no coordinates")]
    MissingCoordinates(IpAddr),

    #[error("GeoIP lookup failed for {0}")]
    Lookup(IpAddr, #[source] maxminddb::MaxMindDBError),
}
