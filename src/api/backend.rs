//! The onboarding backend: guest sessions, profiles and submission.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::onboarding::model::{OnboardingSubmission, UserProfile};

use super::client::ApiClient;

/// Header carrying the user identity on authenticated calls.
pub const USER_ID_HEADER: &str = "X-User-Id";

pub mod endpoints {
    pub const GUEST_SESSION: &str = "/api/auth/guest";
    pub const USER_PROFILE: &str = "/api/user/profile";
    pub const ONBOARDING: &str = "/api/user/onboarding";
}

/// A backend-issued temporary identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestSession {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

/// Backend capabilities the onboarding page consumes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Obtain a guest identity. No identity header is sent.
    async fn create_guest_session(&self) -> Result<GuestSession, ApiError>;

    async fn fetch_user_profile(&self, user_id: &str) -> Result<UserProfile, ApiError>;

    async fn complete_onboarding(
        &self,
        user_id: &str,
        submission: &OnboardingSubmission,
    ) -> Result<Value, ApiError>;
}

/// [`Backend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    api: ApiClient,
}

impl HttpBackend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_guest_session(&self) -> Result<GuestSession, ApiError> {
        let value = self
            .api
            .post(endpoints::GUEST_SESSION, &serde_json::json!({}), &[])
            .await?;

        let has_user_id = value
            .get("user_id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        if !has_user_id {
            return Err(ApiError::InvalidResponse {
                endpoint: endpoints::GUEST_SESSION.to_string(),
                reason: "Failed to create guest session".to_string(),
            });
        }

        let session: GuestSession =
            serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse {
                endpoint: endpoints::GUEST_SESSION.to_string(),
                reason: e.to_string(),
            })?;
        info!(user_id = %session.user_id, "Created guest session");
        Ok(session)
    }

    async fn fetch_user_profile(&self, user_id: &str) -> Result<UserProfile, ApiError> {
        let value = self
            .api
            .get(endpoints::USER_PROFILE, &[(USER_ID_HEADER, user_id)])
            .await?;
        match serde_json::from_value::<UserProfile>(value.clone()) {
            Ok(profile) => Ok(profile),
            Err(e) if value.is_object() => {
                warn!(user_id, error = %e, "Profile did not fully decode, keeping completion flag");
                Ok(UserProfile::from_partial(&value))
            }
            Err(e) => Err(ApiError::InvalidResponse {
                endpoint: endpoints::USER_PROFILE.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn complete_onboarding(
        &self,
        user_id: &str,
        submission: &OnboardingSubmission,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(submission).map_err(|e| ApiError::InvalidResponse {
            endpoint: endpoints::ONBOARDING.to_string(),
            reason: e.to_string(),
        })?;
        self.api
            .post(endpoints::ONBOARDING, &body, &[(USER_ID_HEADER, user_id)])
            .await
    }
}
