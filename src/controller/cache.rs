use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::domain::SensorSnapshot;

/// Longest a snapshot may be reused.
pub const MAX_SNAPSHOT_TTL: std::time::Duration = std::time::Duration::from_secs(30);

/// Reuses a sensor snapshot until it is older than the TTL.
///
/// Entries only expire by age; nothing invalidates them early.
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    slot: Mutex<Option<SensorSnapshot>>,
}

impl SnapshotCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        let ttl = ttl.min(MAX_SNAPSHOT_TTL);
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(30)),
            slot: Mutex::new(None),
        }
    }

    /// Fresh cached snapshot, or a new one from `capture`.
    pub fn get_or_capture<F>(&self, now: DateTime<Utc>, capture: F) -> SensorSnapshot
    where
        F: FnOnce() -> SensorSnapshot,
    {
        let mut slot = self.slot.lock();
        if let Some(snapshot) = slot.as_ref().filter(|s| s.age(now) <= self.ttl) {
            return snapshot.clone();
        }
        let snapshot = capture();
        *slot = Some(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_at(at: DateTime<Utc>, radiation: f64) -> SensorSnapshot {
        SensorSnapshot::new(radiation, 30.0, 180.0).captured_at(at)
    }

    #[test]
    fn test_reuses_within_ttl() {
        let cache = SnapshotCache::new(std::time::Duration::from_secs(30));
        let t0 = Utc::now();

        let first = cache.get_or_capture(t0, || snapshot_at(t0, 100.0));
        let second = cache.get_or_capture(t0 + Duration::seconds(29), || snapshot_at(t0, 999.0));

        assert_eq!(first.solar_radiation_w_m2, 100.0);
        assert_eq!(second.solar_radiation_w_m2, 100.0);
    }

    #[test]
    fn test_recaptures_after_ttl() {
        let cache = SnapshotCache::new(std::time::Duration::from_secs(30));
        let t0 = Utc::now();
        cache.get_or_capture(t0, || snapshot_at(t0, 100.0));

        let later = t0 + Duration::seconds(31);
        let refreshed = cache.get_or_capture(later, || snapshot_at(later, 200.0));

        assert_eq!(refreshed.solar_radiation_w_m2, 200.0);
        let again =
            cache.get_or_capture(later + Duration::seconds(5), || snapshot_at(later, 300.0));
        assert_eq!(again.solar_radiation_w_m2, 200.0);
    }

    #[test]
    fn test_ttl_never_exceeds_30_seconds() {
        let cache = SnapshotCache::new(std::time::Duration::from_secs(300));
        let t0 = Utc::now();
        cache.get_or_capture(t0, || snapshot_at(t0, 100.0));

        let later = t0 + Duration::seconds(250);
        let refreshed = cache.get_or_capture(later, || snapshot_at(later, 200.0));
        assert_eq!(refreshed.solar_radiation_w_m2, 200.0);
    }
}
