//! Onboarding page: first-visit flow collecting interests and a nickname.
//!
//! The controller resolves who the visitor is, checks whether they already
//! onboarded, collects their selections, and submits them to the backend.
//! Once complete, the visitor picks how to enter the dashboard.

pub mod controller;
pub mod model;
pub mod navigation;
pub mod session;
pub mod state;

pub use controller::{
    IdentitySource, InitOutcome, OnboardingController, PageDeps, PageView, SubmitOutcome,
};
pub use model::{Interest, InterestSet, OnboardingSubmission, UserProfile};
pub use navigation::{Navigator, PostCompletionAction, RecordingNavigator};
pub use session::OnboardingSession;
pub use state::{OnboardingStep, StepStatus};
