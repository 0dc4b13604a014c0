// Core school module - classes, courses and gradebooks.
// Following the same pattern as the grading module.

pub mod school_models;
pub mod school_service;

pub use school_models::*;
pub use school_service::*;
