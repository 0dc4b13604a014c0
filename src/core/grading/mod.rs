// Core grading module - the Grade value type, its text codec, and per-guild formats.

pub mod grade_codec;
pub mod grading_models;
pub mod grading_service;

pub use grading_models::*;
pub use grading_service::*;
