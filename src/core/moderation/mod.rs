// Core moderation module - message safety classification and alert triage.

pub mod content_filter;
pub mod moderation_models;
pub mod moderation_service;

pub use content_filter::classify;
pub use moderation_models::*;
pub use moderation_service::*;
