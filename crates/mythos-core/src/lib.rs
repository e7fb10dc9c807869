//! Core types and trait definitions for the Mythos worldbuilding store.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::WorldStore`]; the API layer depends on that
//! abstraction only.

// Native `async fn` in traits; the store trait spells out `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod entity;
pub mod error;
pub mod kind;
pub mod link;
pub mod project;
pub mod search;
pub mod store;
pub mod timeline;
pub mod validate;
pub mod world;

pub use entity::{Entity, Reference, Scoped};
pub use error::{DomainError, Error, Result};
pub use kind::EntityKind;
