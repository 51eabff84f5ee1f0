//! Where the page sends the browser once onboarding is done.

use std::sync::{Mutex, MutexGuard};

use reqwest::Url;
use tracing::info;

use crate::ui::Severity;

/// Query parameter that overrides identity resolution.
pub const USER_ID_PARAM: &str = "user_id";

/// The three choices offered on the completion panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCompletionAction {
    /// Dashboard with the guided tour (`tour=true`).
    StartTour,
    /// Dashboard straight into creation (`create=true`).
    CreateDirect,
    /// Plain dashboard.
    SkipTour,
}

impl PostCompletionAction {
    /// Destination URL under `dashboard`.
    pub fn destination(&self, dashboard: &Url) -> Url {
        let mut url = dashboard.clone();
        match self {
            Self::StartTour => {
                url.query_pairs_mut().append_pair("tour", "true");
            }
            Self::CreateDirect => {
                url.query_pairs_mut().append_pair("create", "true");
            }
            Self::SkipTour => {}
        }
        url
    }

    /// Toast shown before navigating.
    pub fn confirmation(&self) -> (Severity, &'static str) {
        match self {
            Self::StartTour => (Severity::Success, "Starting the guided tour!"),
            Self::CreateDirect => (Severity::Success, "Let's create your first agent!"),
            Self::SkipTour => (Severity::Info, "Heading to the dashboard!"),
        }
    }
}

/// Full-page navigation.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &Url);
}

/// Navigator that only remembers where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Url> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Url> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Url>> {
        self.visits.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &Url) {
        info!(url = %url, "Navigating");
        self.lock().push(url.clone());
    }
}

/// Non-empty `user_id` query parameter of the page URL.
pub fn user_id_from_query(page_url: &Url) -> Option<String> {
    page_url
        .query_pairs()
        .find(|(k, _)| k == USER_ID_PARAM)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dashboard() -> Url {
        Url::parse("http://localhost:8000/assets/dashboard.html").unwrap()
    }

    #[test]
    fn destinations_carry_mode_flag() {
        assert_eq!(
            PostCompletionAction::StartTour.destination(&dashboard()).as_str(),
            "http://localhost:8000/assets/dashboard.html?tour=true"
        );
        assert_eq!(
            PostCompletionAction::CreateDirect.destination(&dashboard()).as_str(),
            "http://localhost:8000/assets/dashboard.html?create=true"
        );
        assert_eq!(
            PostCompletionAction::SkipTour.destination(&dashboard()).as_str(),
            "http://localhost:8000/assets/dashboard.html"
        );
    }

    #[test]
    fn confirmation_severity() {
        assert_eq!(PostCompletionAction::StartTour.confirmation().0, Severity::Success);
        assert_eq!(PostCompletionAction::SkipTour.confirmation().0, Severity::Info);
    }

    #[test]
    fn user_id_param_extraction() {
        let url = Url::parse("http://x/onboarding.html?user_id=abc123&x=1").unwrap();
        assert_eq!(user_id_from_query(&url).as_deref(), Some("abc123"));

        let empty = Url::parse("http://x/onboarding.html?user_id=").unwrap();
        assert!(user_id_from_query(&empty).is_none());

        let none = Url::parse("http://x/onboarding.html").unwrap();
        assert!(user_id_from_query(&none).is_none());
    }

    #[test]
    fn recording_navigator_keeps_history() {
        let nav = RecordingNavigator::new();
        nav.navigate(&dashboard());
        nav.navigate(&PostCompletionAction::StartTour.destination(&dashboard()));
        assert_eq!(nav.history().len(), 2);
        assert!(nav.last().unwrap().as_str().ends_with("tour=true"));
    }
}
