//! Interest vocabulary, profile payloads and nickname rules.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::OnboardingError;

/// Minimum trimmed nickname length for submission.
pub const NICKNAME_MIN_LEN: usize = 2;
/// Maximum nickname length accepted by [`validate_nickname`].
pub const NICKNAME_MAX_LEN: usize = 20;

static NICKNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[가-힣a-zA-Z0-9\s]+$").expect("nickname regex"));

/// The fixed interest vocabulary offered on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interest {
    Investment,
    News,
    Analytics,
    Communication,
    Ecommerce,
    Research,
    Business,
    Personal,
    Marketing,
}

impl Interest {
    pub const ALL: [Interest; 9] = [
        Self::Investment,
        Self::News,
        Self::Analytics,
        Self::Communication,
        Self::Ecommerce,
        Self::Research,
        Self::Business,
        Self::Personal,
        Self::Marketing,
    ];

    /// Tag sent to the backend.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Investment => "investment",
            Self::News => "news",
            Self::Analytics => "analytics",
            Self::Communication => "communication",
            Self::Ecommerce => "ecommerce",
            Self::Research => "research",
            Self::Business => "business",
            Self::Personal => "personal",
            Self::Marketing => "marketing",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Investment => "Investment & finance",
            Self::News => "News & information",
            Self::Analytics => "Data analysis & reports",
            Self::Communication => "Communication",
            Self::Ecommerce => "E-commerce",
            Self::Research => "Learning & research",
            Self::Business => "Work automation",
            Self::Personal => "Personal life",
            Self::Marketing => "Marketing & sales",
        }
    }
}

impl FromStr for Interest {
    type Err = OnboardingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.tag() == s)
            .ok_or_else(|| OnboardingError::UnknownInterest(s.to_string()))
    }
}

impl std::fmt::Display for Interest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Display name for a tag; unknown tags are shown as-is.
pub fn interest_display_name(tag: &str) -> String {
    tag.parse::<Interest>()
        .map(|i| i.display_name().to_string())
        .unwrap_or_else(|_| tag.to_string())
}

/// Unique interest tags in the order they were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestSet(Vec<String>);

impl InterestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (`checked`) or remove a tag. Returns whether the set changed.
    pub fn toggle(&mut self, tag: &str, checked: bool) -> bool {
        if checked {
            if self.contains(tag) {
                return false;
            }
            self.0.push(tag.to_string());
            true
        } else {
            let before = self.0.len();
            self.0.retain(|t| t != tag);
            self.0.len() != before
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Body of the onboarding submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingSubmission {
    pub interests: Vec<String>,
    pub nickname: String,
}

/// User profile as stored by the backend.
///
/// Decoding is lenient: `null` reads as the field's default and an
/// unrecognised timestamp reads as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interests: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub onboarding_completed: bool,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub onboarding_completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

impl UserProfile {
    /// Salvage the completion flag from a payload that does not decode as a
    /// whole profile.
    pub fn from_partial(value: &serde_json::Value) -> Self {
        Self {
            user_id: value
                .get("user_id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
            onboarding_completed: value
                .get("onboarding_completed")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            ..Self::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339, or a naive ISO timestamp taken as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(raw)) = raw else {
        return Ok(None);
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc()))
}

/// Why a nickname was rejected by [`validate_nickname`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NicknameError {
    #[error("Nickname must be at least {min} characters.", min = NICKNAME_MIN_LEN)]
    TooShort,
    #[error("Nickname cannot exceed {max} characters.", max = NICKNAME_MAX_LEN)]
    TooLong,
    #[error("Nickname may only contain Korean, English letters, digits and spaces.")]
    InvalidCharacters,
}

/// Stricter nickname check than the submit rule: length bounds plus a
/// character whitelist.
pub fn validate_nickname(nickname: &str) -> Result<(), NicknameError> {
    if nickname.trim().chars().count() < NICKNAME_MIN_LEN {
        return Err(NicknameError::TooShort);
    }
    if nickname.chars().count() > NICKNAME_MAX_LEN {
        return Err(NicknameError::TooLong);
    }
    if !NICKNAME_RE.is_match(nickname) {
        return Err(NicknameError::InvalidCharacters);
    }
    Ok(())
}
