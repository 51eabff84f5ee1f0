//! Page-lifetime onboarding session.

use serde::Serialize;

use crate::error::OnboardingError;

use super::model::{InterestSet, NICKNAME_MIN_LEN, OnboardingSubmission};
use super::state::OnboardingStep;

/// Everything the page has collected so far.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingSession {
    step: OnboardingStep,
    interests: InterestSet,
    nickname: String,
    user_id: String,
}

impl OnboardingSession {
    /// Start a session for a resolved identity.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            step: OnboardingStep::default(),
            interests: InterestSet::new(),
            nickname: String::new(),
            user_id: user_id.into(),
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn interests(&self) -> &InterestSet {
        &self.interests
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns whether the set changed.
    pub fn toggle_interest(&mut self, tag: &str, checked: bool) -> bool {
        self.interests.toggle(tag, checked)
    }

    /// Store the nickname, trimmed.
    pub fn set_nickname(&mut self, raw: &str) {
        self.nickname = raw.trim().to_string();
    }

    /// At least one interest and a nickname of two or more characters,
    /// counted as Unicode scalar values.
    pub fn can_submit(&self) -> bool {
        !self.interests.is_empty() && self.nickname.chars().count() >= NICKNAME_MIN_LEN
    }

    pub fn submission(&self) -> OnboardingSubmission {
        OnboardingSubmission {
            interests: self.interests.to_vec(),
            nickname: self.nickname.clone(),
        }
    }

    /// Move to `Complete`. Fails if already there.
    pub fn complete(&mut self) -> Result<OnboardingStep, OnboardingError> {
        let target = OnboardingStep::Complete;
        if !self.step.can_transition_to(target) {
            return Err(OnboardingError::InvalidTransition {
                from: self.step.to_string(),
                to: target.to_string(),
            });
        }
        self.step = target;
        Ok(target)
    }
}
