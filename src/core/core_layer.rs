// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "grading/mod.rs"]
pub mod grading;

#[path = "school/mod.rs"]
pub mod school;

#[path = "roles/school_roles.rs"]
pub mod roles;
