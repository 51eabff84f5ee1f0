//! OnboardingController: resolves the user, collects interests and a
//! nickname, submits them, and hands off to the dashboard.
//!
//! All handlers take `&mut self`: one controller per page load, driven by
//! one event loop. Backend calls are the only suspension points.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Url;
use tracing::{debug, error, info, warn};

use crate::api::Backend;
use crate::config::Config;
use crate::error::OnboardingError;
use crate::ui::{LoadingIndicator, Notifier, escape_html, loading};

use super::navigation::{Navigator, PostCompletionAction, user_id_from_query};
use super::session::OnboardingSession;
use super::state::{OnboardingStep, PROGRESS_POSITIONS, StepStatus, progress_indicator};

/// Prefix of identities synthesized when no guest session could be created.
pub const FALLBACK_USER_PREFIX: &str = "guest-user-";

const MSG_INVALID_INPUT: &str =
    "Please pick at least one interest and enter a nickname of 2 or more characters.";
const MSG_SAVING: &str = "Saving your onboarding details...";
const MSG_SUBMIT_FAILED: &str = "Something went wrong while completing onboarding. Please try again.";
const MSG_NOT_COMPLETE: &str = "Please finish onboarding first.";

/// Collaborators the page is wired to.
#[derive(Clone)]
pub struct PageDeps {
    pub backend: Arc<dyn Backend>,
    pub notifier: Arc<dyn Notifier>,
    pub loading: Arc<dyn LoadingIndicator>,
    pub navigator: Arc<dyn Navigator>,
}

/// Where the user id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    QueryParam,
    GuestSession,
    /// Local placeholder; never registered with the backend.
    Fallback,
}

/// Result of loading the page.
pub enum InitOutcome {
    /// The interest step is showing.
    Ready(OnboardingController),
    /// The user had already onboarded and was sent to the dashboard.
    Redirected(Url),
}

/// Result of a submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    Rejected,
    /// The backend call failed; the user may retry.
    Failed,
    Completed,
    /// Already submitted; nothing was sent.
    AlreadyComplete,
}

/// What the page currently renders, derived from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub visible_panel: OnboardingStep,
    pub submit_enabled: bool,
    /// Interest cards rendered as selected, in selection order.
    pub selected_cards: Vec<String>,
    /// Escaped nickname shown on the completion panel.
    pub completion_nickname: Option<String>,
    pub progress: [StepStatus; PROGRESS_POSITIONS],
}

impl PageView {
    fn for_session(session: &OnboardingSession) -> Self {
        Self {
            visible_panel: session.step(),
            submit_enabled: false,
            selected_cards: Vec::new(),
            completion_nickname: None,
            progress: progress_indicator(session.step()),
        }
    }
}

pub struct OnboardingController {
    config: Config,
    deps: PageDeps,
    session: OnboardingSession,
    identity_source: IdentitySource,
    view: PageView,
}

impl OnboardingController {
    /// Load the page: resolve the user, then check whether they already
    /// finished onboarding.
    ///
    /// Identity comes from the `user_id` query parameter, else a new guest
    /// session, else a local `guest-user-<millis>` placeholder. A failed
    /// profile fetch is logged and ignored.
    pub async fn init(config: Config, deps: PageDeps) -> InitOutcome {
        let (user_id, identity_source) =
            resolve_identity(deps.backend.as_ref(), config.page_url.as_ref()).await;
        info!(user_id = %user_id, source = ?identity_source, "Resolved onboarding user");

        match deps.backend.fetch_user_profile(&user_id).await {
            Ok(profile) if profile.onboarding_completed => {
                info!(user_id = %user_id, "Onboarding already completed; redirecting");
                let url = config.dashboard_url.clone();
                deps.navigator.navigate(&url);
                return InitOutcome::Redirected(url);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(user_id = %user_id, "Failed to fetch user profile: {}", e);
            }
        }

        let session = OnboardingSession::new(user_id);
        let view = PageView::for_session(&session);
        let mut controller = Self {
            config,
            deps,
            session,
            identity_source,
            view,
        };
        controller.refresh_view();
        InitOutcome::Ready(controller)
    }

    pub fn session(&self) -> &OnboardingSession {
        &self.session
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub fn identity_source(&self) -> IdentitySource {
        self.identity_source
    }

    /// An interest checkbox changed.
    pub fn handle_interest_change(&mut self, tag: &str, checked: bool) {
        if self.session.step().is_terminal() {
            debug!(tag = %tag, "Ignoring interest change after completion");
            return;
        }
        self.session.toggle_interest(tag, checked);
        self.refresh_view();
    }

    /// The nickname field changed.
    pub fn handle_nickname_input(&mut self, raw: &str) {
        if self.session.step().is_terminal() {
            return;
        }
        self.session.set_nickname(raw);
        self.refresh_view();
    }

    /// A key was pressed in the nickname field. Enter submits, but only
    /// while the submit button is enabled.
    pub async fn handle_nickname_key(&mut self, key: &str) -> Option<SubmitOutcome> {
        if key == "Enter" && self.view.submit_enabled {
            Some(self.complete_onboarding().await)
        } else {
            None
        }
    }

    /// Submit the collected interests and nickname.
    pub async fn complete_onboarding(&mut self) -> SubmitOutcome {
        if self.session.step().is_terminal() {
            debug!(user_id = %self.session.user_id(), "Onboarding already submitted");
            return SubmitOutcome::AlreadyComplete;
        }
        if !self.session.can_submit() {
            self.deps.notifier.warning(MSG_INVALID_INPUT);
            return SubmitOutcome::Rejected;
        }

        let _loading = loading::guard(Arc::clone(&self.deps.loading), MSG_SAVING);
        let submission = self.session.submission();

        match self
            .deps
            .backend
            .complete_onboarding(self.session.user_id(), &submission)
            .await
        {
            Ok(result) => {
                info!(
                    user_id = %self.session.user_id(),
                    interests = submission.interests.len(),
                    %result,
                    "Onboarding completed"
                );
                if let Err(e) = self.session.complete() {
                    warn!("Failed to advance onboarding step: {}", e);
                }
                self.refresh_view();
                self.view.completion_nickname = Some(escape_html(self.session.nickname()));
                self.deps.notifier.success(&format!(
                    "Welcome, {}! Your onboarding is complete.",
                    self.session.nickname()
                ));
                SubmitOutcome::Completed
            }
            Err(e) => {
                error!(user_id = %self.session.user_id(), "Failed to complete onboarding: {}", e);
                self.deps.notifier.error(MSG_SUBMIT_FAILED);
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn start_tour(&self) -> Result<Url, OnboardingError> {
        self.finish(PostCompletionAction::StartTour).await
    }

    pub async fn create_direct(&self) -> Result<Url, OnboardingError> {
        self.finish(PostCompletionAction::CreateDirect).await
    }

    pub async fn skip_tour(&self) -> Result<Url, OnboardingError> {
        self.finish(PostCompletionAction::SkipTour).await
    }

    /// Confirm the choice, wait `redirect_delay` so the toast is seen, then
    /// navigate.
    pub async fn finish(&self, action: PostCompletionAction) -> Result<Url, OnboardingError> {
        if !self.session.step().is_terminal() {
            self.deps.notifier.warning(MSG_NOT_COMPLETE);
            return Err(OnboardingError::NotComplete);
        }

        let (severity, message) = action.confirmation();
        self.deps.notifier.notify(severity, message);

        let url = action.destination(&self.config.dashboard_url);
        tokio::time::sleep(self.config.redirect_delay).await;
        self.deps.navigator.navigate(&url);
        Ok(url)
    }

    fn refresh_view(&mut self) {
        let step = self.session.step();
        self.view.visible_panel = step;
        self.view.submit_enabled = !step.is_terminal() && self.session.can_submit();
        self.view.selected_cards = self.session.interests().to_vec();
        self.view.progress = progress_indicator(step);
    }
}

/// Pick the user id for this page load.
pub async fn resolve_identity(
    backend: &dyn Backend,
    page_url: Option<&Url>,
) -> (String, IdentitySource) {
    if let Some(user_id) = page_url.and_then(user_id_from_query) {
        return (user_id, IdentitySource::QueryParam);
    }

    match backend.create_guest_session().await {
        Ok(session) => (session.user_id, IdentitySource::GuestSession),
        Err(e) => {
            warn!("Guest session creation failed, using local id: {}", e);
            (fallback_user_id(), IdentitySource::Fallback)
        }
    }
}

/// `guest-user-<unix millis>`.
pub fn fallback_user_id() -> String {
    format!("{FALLBACK_USER_PREFIX}{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::api::GuestSession;
    use crate::error::ApiError;
    use crate::onboarding::model::{OnboardingSubmission, UserProfile};
    use crate::onboarding::navigation::RecordingNavigator;
    use crate::ui::{LoadingOverlay, NotificationCenter, Severity};

    /// Scripted backend that counts calls.
    #[derive(Default)]
    struct StubBackend {
        guest_fails: bool,
        profile: Option<UserProfile>,
        submit_fails: bool,
        guest_calls: AtomicUsize,
        profile_calls: AtomicUsize,
        submissions: Mutex<Vec<(String, OnboardingSubmission)>>,
    }

    #[async_trait]
    impl Backend for StubBackend {
        async fn create_guest_session(&self) -> Result<GuestSession, ApiError> {
            self.guest_calls.fetch_add(1, Ordering::SeqCst);
            if self.guest_fails {
                return Err(ApiError::Status {
                    status: 500,
                    message: "HTTP 500: Internal Server Error".to_string(),
                });
            }
            Ok(GuestSession {
                user_id: "guest_42".to_string(),
                session_id: None,
                user_type: Some("guest".to_string()),
            })
        }

        async fn fetch_user_profile(&self, _user_id: &str) -> Result<UserProfile, ApiError> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            self.profile.clone().ok_or(ApiError::Status {
                status: 404,
                message: "User not found".to_string(),
            })
        }

        async fn complete_onboarding(
            &self,
            user_id: &str,
            submission: &OnboardingSubmission,
        ) -> Result<Value, ApiError> {
            self.submissions
                .lock()
                .unwrap()
                .push((user_id.to_string(), submission.clone()));
            if self.submit_fails {
                return Err(ApiError::Network {
                    endpoint: "/api/user/onboarding".to_string(),
                    reason: "connection reset".to_string(),
                });
            }
            Ok(serde_json::json!({"success": true}))
        }
    }

    struct Harness {
        backend: Arc<StubBackend>,
        notifications: Arc<NotificationCenter>,
        loading: Arc<LoadingOverlay>,
        navigator: Arc<RecordingNavigator>,
    }

    impl Harness {
        fn new(backend: StubBackend) -> Self {
            Self {
                backend: Arc::new(backend),
                notifications: Arc::new(NotificationCenter::with_duration(Duration::ZERO)),
                loading: Arc::new(LoadingOverlay::new()),
                navigator: Arc::new(RecordingNavigator::new()),
            }
        }

        fn deps(&self) -> PageDeps {
            PageDeps {
                backend: self.backend.clone(),
                notifier: self.notifications.clone(),
                loading: self.loading.clone(),
                navigator: self.navigator.clone(),
            }
        }

        fn config(page_url: Option<&str>) -> Config {
            Config {
                redirect_delay: Duration::ZERO,
                page_url: page_url.map(|u| Url::parse(u).unwrap()),
                ..Config::default()
            }
        }

        async fn ready(&self, page_url: Option<&str>) -> OnboardingController {
            match OnboardingController::init(Self::config(page_url), self.deps()).await {
                InitOutcome::Ready(c) => c,
                InitOutcome::Redirected(url) => panic!("unexpected redirect to {url}"),
            }
        }

        fn severities(&self) -> Vec<Severity> {
            self.notifications
                .active()
                .iter()
                .map(|t| t.severity)
                .collect()
        }

        fn submission_count(&self) -> usize {
            self.backend.submissions.lock().unwrap().len()
        }
    }

    // ── Identity resolution ─────────────────────────────────────────

    #[tokio::test]
    async fn query_param_skips_guest_session() {
        let h = Harness::new(StubBackend::default());
        let c = h
            .ready(Some("http://localhost/onboarding.html?user_id=abc123"))
            .await;

        assert_eq!(c.session().user_id(), "abc123");
        assert_eq!(c.identity_source(), IdentitySource::QueryParam);
        assert_eq!(h.backend.guest_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.backend.profile_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn guest_session_used_without_param() {
        let h = Harness::new(StubBackend::default());
        let c = h.ready(None).await;
        assert_eq!(c.session().user_id(), "guest_42");
        assert_eq!(c.identity_source(), IdentitySource::GuestSession);
    }

    #[tokio::test]
    async fn guest_failure_falls_back_to_timestamp_id() {
        let h = Harness::new(StubBackend {
            guest_fails: true,
            ..Default::default()
        });
        let c = h.ready(None).await;

        let re = regex::Regex::new(r"^guest-user-\d+$").unwrap();
        assert!(re.is_match(c.session().user_id()), "{}", c.session().user_id());
        assert_eq!(c.identity_source(), IdentitySource::Fallback);
        // Not surfaced to the user.
        assert!(h.notifications.active().is_empty());
    }

    #[tokio::test]
    async fn completed_profile_redirects_before_rendering() {
        let h = Harness::new(StubBackend {
            profile: Some(UserProfile {
                onboarding_completed: true,
                ..Default::default()
            }),
            ..Default::default()
        });

        let outcome =
            OnboardingController::init(Harness::config(Some("http://x/?user_id=u1")), h.deps())
                .await;

        match outcome {
            InitOutcome::Redirected(url) => {
                assert_eq!(url.as_str(), "http://localhost:8000/assets/dashboard.html");
            }
            InitOutcome::Ready(_) => panic!("expected redirect"),
        }
        assert_eq!(h.navigator.history().len(), 1);
    }

    #[tokio::test]
    async fn incomplete_profile_continues() {
        let h = Harness::new(StubBackend {
            profile: Some(UserProfile::default()),
            ..Default::default()
        });
        let c = h.ready(None).await;
        assert_eq!(c.view().visible_panel, OnboardingStep::Interests);
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn profile_fetch_failure_is_not_fatal() {
        let h = Harness::new(StubBackend::default());
        let c = h.ready(None).await;
        assert_eq!(c.session().step(), OnboardingStep::Interests);
        assert_eq!(
            c.view().progress,
            [StepStatus::Completed, StepStatus::Active, StepStatus::Pending]
        );
    }

    // ── Capture ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn submit_enablement_tracks_input() {
        let h = Harness::new(StubBackend::default());
        let mut c = h.ready(None).await;
        assert!(!c.view().submit_enabled);

        c.handle_interest_change("news", true);
        assert!(!c.view().submit_enabled);
        assert_eq!(c.view().selected_cards, vec!["news"]);

        c.handle_nickname_input("  K ");
        assert!(!c.view().submit_enabled);

        c.handle_nickname_input(" Kim ");
        assert!(c.view().submit_enabled);
        assert_eq!(c.session().nickname(), "Kim");

        c.handle_interest_change("news", false);
        assert!(!c.view().submit_enabled);
        assert!(c.view().selected_cards.is_empty());
    }

    // ── Submission ──────────────────────────────────────────────────

    #[tokio::test]
    async fn short_nickname_is_rejected_without_network() {
        let h = Harness::new(StubBackend::default());
        let mut c = h.ready(None).await;
        c.handle_interest_change("news", true);

        for nickname in ["", "a", "  b  "] {
            c.handle_nickname_input(nickname);
            assert_eq!(c.complete_onboarding().await, SubmitOutcome::Rejected);
        }

        assert_eq!(h.submission_count(), 0);
        assert!(h.severities().iter().all(|s| *s == Severity::Warning));
        assert!(!h.loading.is_visible());
    }

    #[tokio::test]
    async fn empty_interests_are_rejected_without_network() {
        let h = Harness::new(StubBackend::default());
        let mut c = h.ready(None).await;
        c.handle_nickname_input("Kim");

        assert_eq!(c.complete_onboarding().await, SubmitOutcome::Rejected);
        assert_eq!(h.submission_count(), 0);
        assert_eq!(h.severities(), vec![Severity::Warning]);
    }

    #[tokio::test]
    async fn successful_submission_completes() {
        let h = Harness::new(StubBackend::default());
        let mut c = h.ready(Some("http://x/?user_id=abc123")).await;
        c.handle_interest_change("news", true);
        c.handle_interest_change("business", true);
        c.handle_nickname_input(" Kim ");

        assert_eq!(c.complete_onboarding().await, SubmitOutcome::Completed);

        let submissions = h.backend.submissions.lock().unwrap().clone();
        assert_eq!(submissions.len(), 1);
        let (user_id, submission) = &submissions[0];
        assert_eq!(user_id, "abc123");
        assert_eq!(submission.interests, vec!["news", "business"]);
        assert_eq!(submission.nickname, "Kim");

        assert_eq!(c.session().step(), OnboardingStep::Complete);
        assert_eq!(c.view().visible_panel, OnboardingStep::Complete);
        assert_eq!(c.view().completion_nickname.as_deref(), Some("Kim"));
        assert_eq!(
            c.view().progress,
            [StepStatus::Completed, StepStatus::Completed, StepStatus::Active]
        );
        assert!(!c.view().submit_enabled);
        assert_eq!(h.severities(), vec![Severity::Success]);
        assert!(!h.loading.is_visible());
    }

    #[tokio::test]
    async fn completion_is_sticky() {
        let h = Harness::new(StubBackend::default());
        let mut c = h.ready(None).await;
        c.handle_interest_change("news", true);
        c.handle_nickname_input("Kim");
        c.complete_onboarding().await;

        c.handle_interest_change("news", false);
        c.handle_nickname_input("x");
        assert_eq!(c.complete_onboarding().await, SubmitOutcome::AlreadyComplete);
        assert_eq!(c.session().step(), OnboardingStep::Complete);
        assert_eq!(h.submission_count(), 1);
    }

    #[tokio::test]
    async fn failed_submission_allows_retry() {
        let h = Harness::new(StubBackend {
            submit_fails: true,
            ..Default::default()
        });
        let mut c = h.ready(None).await;
        c.handle_interest_change("research", true);
        c.handle_nickname_input("Kim");

        assert_eq!(c.complete_onboarding().await, SubmitOutcome::Failed);
        assert_eq!(c.session().step(), OnboardingStep::Interests);
        assert!(c.view().submit_enabled);
        assert!(!h.loading.is_visible());
        assert_eq!(h.severities(), vec![Severity::Error]);

        assert_eq!(c.complete_onboarding().await, SubmitOutcome::Failed);
        assert_eq!(h.submission_count(), 2);
    }

    #[tokio::test]
    async fn completion_nickname_is_escaped() {
        let h = Harness::new(StubBackend::default());
        let mut c = h.ready(None).await;
        c.handle_interest_change("news", true);
        c.handle_nickname_input("<b>Kim</b>");
        c.complete_onboarding().await;
        assert_eq!(
            c.view().completion_nickname.as_deref(),
            Some("&lt;b&gt;Kim&lt;/b&gt;")
        );
    }

    #[tokio::test]
    async fn enter_submits_only_when_enabled() {
        let h = Harness::new(StubBackend::default());
        let mut c = h.ready(None).await;
        c.handle_nickname_input("Kim");

        assert_eq!(c.handle_nickname_key("Enter").await, None);
        assert_eq!(h.submission_count(), 0);

        c.handle_interest_change("news", true);
        assert_eq!(c.handle_nickname_key("a").await, None);
        assert_eq!(
            c.handle_nickname_key("Enter").await,
            Some(SubmitOutcome::Completed)
        );
    }

    // ── Post-completion ─────────────────────────────────────────────

    #[tokio::test]
    async fn navigation_requires_completion() {
        let h = Harness::new(StubBackend::default());
        let c = h.ready(None).await;
        assert!(matches!(c.start_tour().await, Err(OnboardingError::NotComplete)));
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn post_completion_actions_navigate_with_flags() {
        let h = Harness::new(StubBackend::default());
        let mut c = h.ready(None).await;
        c.handle_interest_change("news", true);
        c.handle_nickname_input("Kim");
        c.complete_onboarding().await;

        let tour = c.start_tour().await.unwrap();
        let create = c.create_direct().await.unwrap();
        let plain = c.skip_tour().await.unwrap();

        assert_eq!(tour.query(), Some("tour=true"));
        assert_eq!(create.query(), Some("create=true"));
        assert_eq!(plain.query(), None);
        assert_eq!(h.navigator.history(), vec![tour, create, plain]);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_waits_for_redirect_delay() {
        let h = Harness::new(StubBackend::default());
        let config = Config {
            redirect_delay: Duration::from_millis(1500),
            ..Config::default()
        };
        let InitOutcome::Ready(mut c) = OnboardingController::init(config, h.deps()).await else {
            panic!("expected ready");
        };
        c.handle_interest_change("news", true);
        c.handle_nickname_input("Kim");
        c.complete_onboarding().await;

        let started = tokio::time::Instant::now();
        c.skip_tour().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(h.navigator.history().len(), 1);
    }

    #[test]
    fn fallback_id_has_prefix() {
        let id = fallback_user_id();
        assert!(id.starts_with(FALLBACK_USER_PREFIX));
        assert!(id[FALLBACK_USER_PREFIX.len()..].parse::<i64>().is_ok());
    }
}
