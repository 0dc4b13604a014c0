// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "grading/grading_store.rs"]
pub mod grading;

#[path = "school/school_store.rs"]
pub mod school;
