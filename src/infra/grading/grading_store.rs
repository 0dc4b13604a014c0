// Implementations for grade format storage.

pub mod json_store;

pub use json_store::JsonGradeFormatStore;
