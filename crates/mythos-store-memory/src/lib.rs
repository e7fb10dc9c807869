//! In-memory backend for the Mythos world store.
//!
//! Nothing survives a restart. Used for development, demos and tests; see
//! [`fixtures`] for a ready-made sample world.

pub mod fixtures;
mod store;

pub use store::MemoryStore;

#[cfg(test)]
mod tests;
