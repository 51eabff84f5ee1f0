//! Onboarding flow: a headless onboarding page and its UI helpers.

pub mod api;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod ui;
