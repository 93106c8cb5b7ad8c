use chrono::Duration;

use crate::value_objects::{ParticipantName, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Participant {
    pub name: ParticipantName,
    pub last_seen: Timestamp,
}

impl Participant {
    pub fn register(name: ParticipantName, now: Timestamp) -> Self {
        Self {
            name,
            last_seen: now,
        }
    }

    /// 心跳刷新
    pub fn touch(&mut self, now: Timestamp) {
        self.last_seen = now;
    }

    /// 距上次心跳超过 `timeout` 即视为离开（严格大于）
    pub fn is_inactive(&self, now: Timestamp, timeout: Duration) -> bool {
        now - self.last_seen > timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn alice_at(secs: i64) -> Participant {
        let at = Utc.timestamp_opt(secs, 0).unwrap();
        Participant::register(ParticipantName::parse("Alice").unwrap(), at)
    }

    #[test]
    fn inactivity_is_strictly_greater_than_timeout() {
        let participant = alice_at(0);
        let timeout = Duration::seconds(10);

        assert!(!participant.is_inactive(Utc.timestamp_opt(10, 0).unwrap(), timeout));
        assert!(participant.is_inactive(Utc.timestamp_opt(11, 0).unwrap(), timeout));
    }

    #[test]
    fn touch_moves_last_seen_forward() {
        let mut participant = alice_at(0);
        let later = Utc.timestamp_opt(8, 0).unwrap();
        participant.touch(later);

        assert_eq!(participant.last_seen, later);
        assert!(!participant.is_inactive(Utc.timestamp_opt(15, 0).unwrap(), Duration::seconds(10)));
    }
}
