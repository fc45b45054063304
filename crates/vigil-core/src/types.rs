//! Common types used throughout Vigil.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Unique identifier for a registered document.
///
/// Deserialization only accepts the lowercase hyphenated form, the same text
/// that [`fmt::Display`] writes. [`FromStr`] is lenient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Create a new random document ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a document ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CoreError::InvalidDocumentId(s.to_string()))
    }
}

impl DocumentId {
    /// Parse only the exact text [`fmt::Display`] produces.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocumentId`] for any other spelling.
    pub fn parse_canonical(s: &str) -> CoreResult<Self> {
        let id: Self = s.parse()?;
        if id.to_string() == s {
            Ok(id)
        } else {
            Err(CoreError::InvalidDocumentId(s.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse_canonical(&s).map_err(serde::de::Error::custom)
    }
}

/// UTC timestamp truncated to millisecond precision.
///
/// Serialized as [`Timestamp::canonical`] text. Deserialization rejects any
/// other spelling of the same instant, so stored text and hash input agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`, dropping sub-millisecond precision.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(3))
    }

    /// Canonical text form: RFC 3339, three fractional digits, `Z` suffix.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use vigil_core::Timestamp;
    ///
    /// let ts = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    /// assert_eq!(ts.canonical(), "2024-05-01T12:00:00.000Z");
    /// ```
    #[must_use]
    pub fn canonical(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Parse the text [`Timestamp::canonical`] produces, and nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimestamp`] for non-RFC 3339 input, a
    /// non-`Z` offset, or a precision other than milliseconds.
    pub fn parse_canonical(s: &str) -> CoreResult<Self> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|_| CoreError::InvalidTimestamp(s.to_string()))?;
        let ts = Self(parsed.with_timezone(&Utc));
        if ts.canonical() == s {
            Ok(ts)
        } else {
            Err(CoreError::InvalidTimestamp(s.to_string()))
        }
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse_canonical(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

/// Clearance tier required to access a document (1 = lowest, 5 = highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Clearance(u8);

impl Clearance {
    /// Lowest document clearance.
    pub const MIN: u8 = 1;
    /// Highest document clearance.
    pub const MAX: u8 = 5;

    /// Create a clearance level.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidClearance`] if `level` is outside `1..=5`.
    pub fn new(level: u8) -> CoreResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(CoreError::InvalidClearance(level))
        }
    }

    /// The numeric level.
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Clearance {
    type Error = CoreError;

    fn try_from(level: u8) -> CoreResult<Self> {
        Self::new(level)
    }
}

impl From<Clearance> for u8 {
    fn from(c: Clearance) -> Self {
        c.0
    }
}

impl fmt::Display for Clearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of who performed an action, taken at the time of the action.
///
/// Role and clearance are never re-derived later; the ledger records exactly
/// what the access-control collaborator asserted when the call was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Actor {
    /// Stable user identifier, if the collaborator has one.
    pub user_id: Option<String>,
    /// Username.
    pub username: String,
    /// Role name (e.g. `CONFIDENTIAL`).
    pub role: String,
    /// Clearance level; `0` for the system actor.
    pub clearance_level: u8,
}

impl Actor {
    /// Username used for system-initiated records.
    pub const SYSTEM_USERNAME: &'static str = "system";
    /// Role used for system-initiated records.
    pub const SYSTEM_ROLE: &'static str = "SYSTEM";

    /// Create an actor snapshot.
    #[must_use]
    pub fn new(username: impl Into<String>, role: impl Into<String>, clearance_level: u8) -> Self {
        Self {
            user_id: None,
            username: username.into(),
            role: role.into(),
            clearance_level,
        }
    }

    /// The system actor (no user, clearance 0).
    #[must_use]
    pub fn system() -> Self {
        Self::new(Self::SYSTEM_USERNAME, Self::SYSTEM_ROLE, 0)
    }

    /// Attach a stable user identifier.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Whether this actor meets or exceeds `required`.
    #[must_use]
    pub fn meets(&self, required: Clearance) -> bool {
        self.clearance_level >= required.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_document_id_parse() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_timestamp_truncates_to_millis() {
        let dt = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .unwrap()
            .checked_add_signed(chrono::Duration::nanoseconds(123_456_789))
            .unwrap();
        let ts = Timestamp::from_datetime(dt);
        assert_eq!(ts.canonical(), "2024-05-01T12:00:00.123Z");
    }

    #[test]
    fn test_timestamp_serde_preserves_instant() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
        assert_eq!(ts.canonical(), back.canonical());
    }

    #[test]
    fn test_timestamp_rejects_other_spellings() {
        let ts: Timestamp = serde_json::from_str("\"2024-05-01T12:00:00.123Z\"").unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2024-05-01T12:00:00.123Z\"");

        for text in [
            "\"2024-05-01T12:00:00.123999Z\"",
            "\"2024-05-01T14:00:00.123+02:00\"",
            "\"2024-05-01T12:00:00Z\"",
            "\"2024-05-01T12:00:00.123+00:00\"",
            "\"2024-05-01 12:00:00\"",
        ] {
            assert!(serde_json::from_str::<Timestamp>(text).is_err(), "{text}");
        }
    }

    #[test]
    fn test_timestamp_whole_second_serializes_with_millis() {
        let ts = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-01-01T00:00:00.000Z\"");
        assert_eq!(serde_json::from_str::<Timestamp>(&json).unwrap(), ts);
    }

    #[test]
    fn test_document_id_serde_is_strict() {
        let id = DocumentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<DocumentId>(&json).unwrap(), id);

        let upper = format!("\"{}\"", id.to_string().to_uppercase());
        assert!(serde_json::from_str::<DocumentId>(&upper).is_err());
        let simple = format!("\"{}\"", id.0.simple());
        assert!(serde_json::from_str::<DocumentId>(&simple).is_err());
        // The command-line parser stays lenient.
        assert_eq!(id.to_string().to_uppercase().parse::<DocumentId>().unwrap(), id);
    }

    #[test]
    fn test_actor_rejects_unknown_fields() {
        let json = r#"{"userId":null,"username":"a","role":"R","clearanceLevel":1,"admin":true}"#;
        assert!(serde_json::from_str::<Actor>(json).is_err());
    }

    #[test]
    fn test_clearance_bounds() {
        assert!(Clearance::new(0).is_err());
        assert!(Clearance::new(6).is_err());
        assert_eq!(Clearance::new(3).unwrap().level(), 3);
        assert!(serde_json::from_str::<Clearance>("9").is_err());
    }

    #[test]
    fn test_actor_meets() {
        let analyst = Actor::new("alice", "CONFIDENTIAL", 3);
        assert!(analyst.meets(Clearance::new(2).unwrap()));
        assert!(analyst.meets(Clearance::new(3).unwrap()));
        assert!(!analyst.meets(Clearance::new(4).unwrap()));
        assert!(!Actor::system().meets(Clearance::new(1).unwrap()));
    }
}
