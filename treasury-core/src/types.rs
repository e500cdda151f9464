//! Core types for the treasury
//!
//! All types are designed for:
//! - Structural serialization (serde_json snapshots)
//! - Memory safety (no unsafe code)
//! - Whole-coin arithmetic (u64, no fractional currency)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Currency amount in whole coins
pub type Coins = u64;

/// Opaque user identifier supplied by the platform layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's persistent economic record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Owning user
    pub id: UserId,

    /// Balance in whole coins, non-negative by construction
    pub balance: Coins,

    /// Message counter toward the next activity reward, always in [0, 100)
    pub messages: u32,

    /// Awarded medals as a bitset (see [`Medal`])
    pub medals: u32,

    /// Free-text profile description
    #[serde(default)]
    pub description: String,

    /// When the weekly reward was last paid out
    #[serde(default)]
    pub last_weekly_claim: Option<DateTime<Utc>>,

    /// When the last successful beg roll happened
    #[serde(default)]
    pub last_beg: Option<DateTime<Utc>>,
}

impl Account {
    /// Fresh account with the given starting balance
    pub fn new(id: UserId, starting_balance: Coins) -> Self {
        Self {
            id,
            balance: starting_balance,
            messages: 0,
            medals: 0,
            description: String::new(),
            last_weekly_claim: None,
            last_beg: None,
        }
    }

    /// Medals currently held, in declaration order
    pub fn medal_list(&self) -> Vec<Medal> {
        Medal::ALL
            .iter()
            .copied()
            .filter(|m| self.medals & m.bit() != 0)
            .collect()
    }
}

/// Awarded-medal flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum Medal {
    /// Won a guild event
    Champion = 1,
    /// Contributed to the bot
    Contributor = 2,
    /// Shipped a published project
    Publisher = 4,
    /// Finished the guild course
    Graduate = 8,
}

impl Medal {
    /// All medals, in bit order
    pub const ALL: [Medal; 4] = [
        Medal::Champion,
        Medal::Contributor,
        Medal::Publisher,
        Medal::Graduate,
    ];

    /// Bit value inside an account's medal set
    pub fn bit(self) -> u32 {
        self as u32
    }

    /// Stable string key used by the command layer
    pub fn key(self) -> &'static str {
        match self {
            Medal::Champion => "champion",
            Medal::Contributor => "contributor",
            Medal::Publisher => "publisher",
            Medal::Graduate => "graduate",
        }
    }

    /// Parse from a string key
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "champion" => Some(Medal::Champion),
            "contributor" => Some(Medal::Contributor),
            "publisher" => Some(Medal::Publisher),
            "graduate" => Some(Medal::Graduate),
            _ => None,
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A time-bounded (or indefinite) moderation mute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mute {
    /// Muted user
    pub user: UserId,

    /// When the mute was applied
    pub started_at: DateTime<Utc>,

    /// How long it lasts
    pub duration: MuteDuration,

    /// Optional moderator-supplied reason
    #[serde(default)]
    pub reason: Option<String>,
}

impl Mute {
    /// When the mute ends, `None` if indefinite
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        match self.duration {
            MuteDuration::Indefinite => None,
            MuteDuration::For(d) => Some(self.started_at + d),
        }
    }

    /// Whether the mute has expired at `now` (indefinite mutes never expire)
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        match self.ends_at() {
            Some(ends) => ends < now,
            None => false,
        }
    }
}

/// Mute duration, serialized as milliseconds with `-1` for indefinite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteDuration {
    /// Never auto-expires
    Indefinite,
    /// Expires after the given span
    For(Duration),
}

impl Serialize for MuteDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MuteDuration::Indefinite => serializer.serialize_i64(-1),
            MuteDuration::For(d) => serializer.serialize_i64(d.num_milliseconds()),
        }
    }
}

impl<'de> Deserialize<'de> for MuteDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ms = i64::deserialize(deserializer)?;
        if ms < 0 {
            Ok(MuteDuration::Indefinite)
        } else {
            Ok(MuteDuration::For(Duration::milliseconds(ms)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medal_keys_round_trip() {
        for medal in Medal::ALL {
            assert_eq!(Medal::from_key(medal.key()), Some(medal));
        }
        assert_eq!(Medal::from_key("emperor"), None);
    }

    #[test]
    fn test_account_medal_list() {
        let mut account = Account::new(UserId::new("u1"), 100);
        assert!(account.medal_list().is_empty());

        account.medals = Medal::Champion.bit() | Medal::Graduate.bit();
        assert_eq!(
            account.medal_list(),
            vec![Medal::Champion, Medal::Graduate]
        );
    }

    #[test]
    fn test_mute_expiry() {
        let now = Utc::now();
        let mute = Mute {
            user: UserId::new("u1"),
            started_at: now,
            duration: MuteDuration::For(Duration::minutes(10)),
            reason: None,
        };

        assert!(!mute.expired(now + Duration::minutes(9)));
        assert!(mute.expired(now + Duration::minutes(11)));

        let forever = Mute {
            user: UserId::new("u2"),
            started_at: now,
            duration: MuteDuration::Indefinite,
            reason: Some("spam".to_string()),
        };
        assert!(forever.ends_at().is_none());
        assert!(!forever.expired(now + Duration::days(10_000)));
    }

    #[test]
    fn test_mute_duration_serde_sentinel() {
        let json = serde_json::to_string(&MuteDuration::Indefinite).unwrap();
        assert_eq!(json, "-1");

        let json = serde_json::to_string(&MuteDuration::For(Duration::seconds(90))).unwrap();
        assert_eq!(json, "90000");

        let parsed: MuteDuration = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, MuteDuration::Indefinite);
    }
}
