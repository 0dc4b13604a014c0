// Implementations for school storage.

pub mod in_memory;

pub use in_memory::InMemorySchoolStore;
