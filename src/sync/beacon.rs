use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::core::BEACON_INTERVAL;
use crate::protocol::Message;

/// Offset of a beacon within the shared interval, derived from its identifier.
///
/// The identifier packs a team and a player slot; the arithmetic runs on the
/// raw byte and wraps, so out-of-range identifiers produce large offsets
/// rather than negative ones.
pub fn beacon_offset(id: u8) -> Duration {
    let team = (id << 4).wrapping_sub(0x0A);
    let player = (id & 0x0F).wrapping_sub(1);
    Duration::from_secs(u64::from(team)) + Duration::from_millis(u64::from(player) * 100)
}

/// Derives the shared beacon schedule from received beacon messages.
///
/// The beacon with the lowest identifier seen so far is the reference: every
/// message it sends re-anchors the schedule at `now - offset(id)`.
#[derive(Debug, Clone)]
pub struct BeaconSync {
    interval: Duration,
    lowest_id: Option<u8>,
    reference_time: Option<SystemTime>,
}

impl Default for BeaconSync {
    fn default() -> Self {
        Self::new(BEACON_INTERVAL)
    }
}

impl BeaconSync {
    /// Creates an unsynchronized schedule repeating every `interval`
    pub fn new(interval: Duration) -> Self {
        BeaconSync {
            interval,
            lowest_id: None,
            reference_time: None,
        }
    }

    /// Lowest beacon identifier observed so far
    pub fn lowest_id(&self) -> Option<u8> {
        self.lowest_id
    }

    /// Instant at which a beacon with offset zero ran the schedule
    pub fn reference_time(&self) -> Option<SystemTime> {
        self.reference_time
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Inspects a received message. Returns true when it re-anchored the
    /// reference time.
    pub fn observe(&mut self, message: &Message, now: SystemTime) -> bool {
        let Some(id) = message.beacon_id() else {
            return false;
        };

        // Identifier 0 is a real beacon here and stays the reference once
        // seen; it is not treated as "no beacon yet".
        if self.lowest_id.map_or(true, |lowest| id < lowest) {
            debug!("Beacon {:#04x} is the new reference beacon", id);
            self.lowest_id = Some(id);
        }
        if self.lowest_id != Some(id) {
            return false;
        }

        match now.checked_sub(beacon_offset(id)) {
            Some(reference) => {
                self.reference_time = Some(reference);
                true
            }
            None => false,
        }
    }

    /// Next instant at or after `now` when beacon `id` is expected to
    /// transmit, or `None` before any reference beacon was observed.
    pub fn next_beacon_time(&self, id: u8, now: SystemTime) -> Option<SystemTime> {
        let scheduled = self.reference_time? + beacon_offset(id);
        let behind = match now.duration_since(scheduled) {
            Ok(behind) if !behind.is_zero() => behind,
            _ => return Some(scheduled),
        };

        let interval = self.interval.as_nanos();
        let periods = behind.as_nanos().div_ceil(interval);
        let advance = periods.checked_mul(interval)?;
        let advance = Duration::new(
            u64::try_from(advance / 1_000_000_000).ok()?,
            (advance % 1_000_000_000) as u32,
        );
        scheduled.checked_add(advance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Command, Direction};
    use std::time::UNIX_EPOCH;

    fn beacon(id: u8) -> Message {
        Message::new(Direction::Request, Command::BEACON, vec![id, 0x00]).unwrap()
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn test_beacon_offset() {
        // 0x11 -> team (0x10 - 10) = 6, player 0
        assert_eq!(beacon_offset(0x11), Duration::from_secs(6));
        // 0x01 -> team (0x10 - 10) = 6, player 0
        assert_eq!(beacon_offset(0x01), Duration::from_secs(6));
        // 0x02 -> team (0x20 - 10) = 22, player 1
        assert_eq!(beacon_offset(0x02), Duration::from_millis(22_100));
        // 0x00 wraps: team (0 - 10) = 246, player (0 - 1) = 255
        assert_eq!(
            beacon_offset(0x00),
            Duration::from_secs(246) + Duration::from_millis(25_500)
        );
    }

    #[test]
    fn test_unknown_before_any_beacon() {
        let sync = BeaconSync::default();
        assert_eq!(sync.lowest_id(), None);
        assert_eq!(sync.reference_time(), None);
        assert_eq!(sync.next_beacon_time(0x03, at(0)), None);
    }

    #[test]
    fn test_non_beacon_ignored() {
        let mut sync = BeaconSync::default();
        let message = Message::request(Command(0x01), vec![0x03]).unwrap();
        assert!(!sync.observe(&message, at(0)));
        assert_eq!(sync.lowest_id(), None);

        let empty = Message::request(Command::BEACON, Vec::new()).unwrap();
        assert!(!sync.observe(&empty, at(0)));
        assert_eq!(sync.lowest_id(), None);
    }

    #[test]
    fn test_lowest_beacon_is_reference() {
        let mut sync = BeaconSync::default();

        assert!(sync.observe(&beacon(5), at(0)));
        assert_eq!(sync.lowest_id(), Some(5));
        assert_eq!(sync.reference_time(), Some(at(0) - beacon_offset(5)));

        assert!(sync.observe(&beacon(3), at(10)));
        assert_eq!(sync.lowest_id(), Some(3));
        let anchored = at(10) - beacon_offset(3);
        assert_eq!(sync.reference_time(), Some(anchored));

        // A higher beacon no longer moves the reference
        assert!(!sync.observe(&beacon(5), at(20)));
        assert_eq!(sync.lowest_id(), Some(3));
        assert_eq!(sync.reference_time(), Some(anchored));

        // The reference beacon re-anchors on every message
        assert!(sync.observe(&beacon(3), at(30)));
        assert_eq!(sync.reference_time(), Some(at(30) - beacon_offset(3)));
    }

    #[test]
    fn test_beacon_zero_stays_lowest() {
        let mut sync = BeaconSync::default();
        assert!(sync.observe(&beacon(0), at(0)));
        assert_eq!(sync.lowest_id(), Some(0));

        assert!(!sync.observe(&beacon(7), at(5)));
        assert_eq!(sync.lowest_id(), Some(0));
        assert_eq!(sync.reference_time(), Some(at(0) - beacon_offset(0)));
    }

    #[test]
    fn test_next_beacon_time_not_in_past() {
        let mut sync = BeaconSync::default();
        sync.observe(&beacon(0x11), at(0));
        // reference = at(0) - 6s

        // Scheduled exactly now
        assert_eq!(sync.next_beacon_time(0x11, at(0)), Some(at(0)));

        // 0x01 shares the offset of 0x11
        assert_eq!(sync.next_beacon_time(0x01, at(1)), Some(at(6)));

        // Far in the future: advanced by whole intervals
        let now = at(100);
        let next = sync.next_beacon_time(0x11, now).unwrap();
        assert!(next >= now);
        assert!(next.duration_since(now).unwrap() < BEACON_INTERVAL);
        assert_eq!(next, at(102));
    }

    #[test]
    fn test_next_beacon_time_future_offset() {
        let mut sync = BeaconSync::default();
        sync.observe(&beacon(0x11), at(0));
        // 0x02 offset 22.1s -> at(-6 + 22.1) = at(16.1)
        let next = sync.next_beacon_time(0x02, at(0)).unwrap();
        assert_eq!(next, at(16) + Duration::from_millis(100));
    }

    #[test]
    fn test_custom_interval() {
        let mut sync = BeaconSync::new(Duration::from_secs(10));
        assert_eq!(sync.interval(), Duration::from_secs(10));
        sync.observe(&beacon(0x11), at(0));
        assert_eq!(sync.next_beacon_time(0x11, at(1)), Some(at(10)));
    }
}
