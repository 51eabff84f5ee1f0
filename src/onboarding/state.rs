//! Onboarding step machine and the progress indicator derived from it.

use serde::{Deserialize, Serialize};

/// Number of positions on the progress indicator.
pub const PROGRESS_POSITIONS: usize = 3;

/// The steps of the onboarding page.
///
/// Progresses linearly: Interests → Complete. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    #[default]
    Interests,
    Complete,
}

impl OnboardingStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        matches!((self, target), (Self::Interests, Self::Complete))
    }

    /// Whether this step is terminal for the page.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// The next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        match self {
            Self::Interests => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    /// 1-based position on the progress indicator. Position 1 is the
    /// welcome screen shown before this page.
    pub fn progress_position(&self) -> usize {
        match self {
            Self::Interests => 2,
            Self::Complete => 3,
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Interests => "interests",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Rendering state of one progress position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Active,
    Pending,
}

impl StepStatus {
    /// CSS class used by the page markup.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Completed => "progress-step completed",
            Self::Active => "progress-step active",
            Self::Pending => "progress-step pending",
        }
    }
}

/// Positions before `step` are completed, `step` is active, later ones
/// pending.
pub fn progress_indicator(step: OnboardingStep) -> [StepStatus; PROGRESS_POSITIONS] {
    let current = step.progress_position();
    std::array::from_fn(|index| {
        let position = index + 1;
        match position.cmp(&current) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Active,
            std::cmp::Ordering::Greater => StepStatus::Pending,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forward_transition_is_valid() {
        use OnboardingStep::*;
        assert!(Interests.can_transition_to(Complete));
        assert!(!Complete.can_transition_to(Interests));
        assert!(!Interests.can_transition_to(Interests));
        assert!(!Complete.can_transition_to(Complete));
    }

    #[test]
    fn next_walks_all_steps() {
        use OnboardingStep::*;
        assert_eq!(Interests.next(), Some(Complete));
        assert_eq!(Complete.next(), None);
        assert!(Complete.is_terminal());
        assert!(!Interests.is_terminal());
    }

    #[test]
    fn display_matches_serde() {
        for step in [OnboardingStep::Interests, OnboardingStep::Complete] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json, "mismatch for {step:?}");
        }
    }

    #[test]
    fn progress_on_interests() {
        assert_eq!(
            progress_indicator(OnboardingStep::Interests),
            [StepStatus::Completed, StepStatus::Active, StepStatus::Pending]
        );
    }

    #[test]
    fn progress_on_complete() {
        assert_eq!(
            progress_indicator(OnboardingStep::Complete),
            [StepStatus::Completed, StepStatus::Completed, StepStatus::Active]
        );
        assert_eq!(StepStatus::Active.css_class(), "progress-step active");
    }
}
