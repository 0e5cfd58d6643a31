//! Memoized forecast highs, keyed by client address.
//!
//! Entries live as long as the pipeline and are never evicted.

use std::collections::HashMap;
use std::net::IpAddr;

#[derive(Debug, Clone, Default)]
pub struct ForecastCache {
    highs: HashMap<IpAddr, f64>,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &IpAddr) -> Option<f64> {
        self.highs.get(address).copied()
    }

    pub fn insert(&mut self, address: IpAddr, high: f64) {
        self.highs.insert(address, high);
    }

    pub fn len(&self) -> usize {
        self.highs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_insert_replaces_earlier() {
        let address: IpAddr = "8.8.8.8".parse().unwrap();
        let mut cache = ForecastCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&address), None);

        cache.insert(address, 61.0);
        cache.insert(address, 62.5);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&address), Some(62.5));
    }
}
