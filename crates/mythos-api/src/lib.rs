//! JSON REST API for Mythos.
//!
//! Exposes an axum [`Router`] backed by any [`mythos_core::store::WorldStore`].
//! Every route requires a bearer token; a [`auth::TokenVerifier`] turns it
//! into a user id, and each project is visible to its owner only. TLS and
//! static file serving are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", mythos_api::api_router(state))
//! ```

pub mod access;
pub mod activity;
pub mod auth;
pub mod error;
pub mod extract;
pub mod links;
pub mod projects;
pub mod records;
pub mod uploads;


use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post},
};
use mythos_core::{
  Entity,
  link::Relationship,
  store::WorldStore,
  world::{Character, Event, Location, LoreEntry, MagicSystem, Note, Race, Spell},
};

pub use error::ApiError;

use crate::{auth::TokenVerifier, uploads::ImageStore};

/// Shared state for every handler.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub auth:   Arc<dyn TokenVerifier>,
  pub images: Arc<dyn ImageStore>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      auth:   Arc::clone(&self.auth),
      images: Arc::clone(&self.images),
    }
  }
}

/// CRUD routes for one record kind, plus its relationship and render views
/// where the kind has them.
fn record_routes<S, E>(router: Router<AppState<S>>) -> Router<AppState<S>>
where
  S: WorldStore + 'static,
  E: Entity,
{
  let base = E::KIND.route();
  let mut router = router
    .route(&format!("/projects/{{id}}/{base}"), get(records::list::<S, E>))
    .route(&format!("/{base}"), post(records::create::<S, E>))
    .route(
      &format!("/{base}/{{id}}"),
      get(records::get_one::<S, E>)
        .patch(records::update::<S, E>)
        .delete(records::delete::<S, E>),
    );
  if E::KIND.is_relationship_endpoint() {
    router = router.route(
      &format!("/{base}/{{id}}/relationships"),
      get(records::relationships::<S, E>),
    );
  }
  if E::TEXT_FIELD.is_some() {
    router = router.route(&format!("/{base}/{{id}}/render"), get(records::render::<S, E>));
  }
  router
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: WorldStore + 'static,
{
  let router = Router::new()
    // Projects
    .route("/projects", get(projects::list::<S>).post(projects::create::<S>))
    .route(
      "/projects/{id}",
      get(projects::get_one::<S>)
        .patch(projects::update::<S>)
        .delete(projects::delete::<S>),
    )
    .route("/projects/{id}/stats", get(projects::stats::<S>))
    .route("/projects/{id}/search", get(projects::search::<S>))
    .route("/projects/{id}/timeline", get(projects::timeline::<S>))
    .route("/projects/{id}/activity", get(projects::activity::<S>))
    // Junctions
    .route(
      "/characters/{id}/spells",
      get(links::spells_of_character::<S>).post(links::link_spell::<S>),
    )
    .route("/characters/{id}/spells/{spell_id}", delete(links::unlink_spell::<S>))
    .route("/characters/{id}/events", get(links::events_of_character::<S>))
    .route(
      "/events/{id}/characters",
      get(links::characters_of_event::<S>).post(links::link_character::<S>),
    )
    .route(
      "/events/{id}/characters/{character_id}",
      delete(links::unlink_character::<S>),
    )
    .route(
      "/magic-systems/{id}/characters",
      get(links::characters_of_magic_system::<S>),
    )
    // Uploads
    .route(
      "/uploads",
      post(uploads::upload::<S>).layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_BODY)),
    )
    .route("/uploads/{name}", delete(uploads::remove::<S>));

  let router = record_routes::<S, Character>(router);
  let router = record_routes::<S, Location>(router);
  let router = record_routes::<S, Event>(router);
  let router = record_routes::<S, MagicSystem>(router);
  let router = record_routes::<S, Spell>(router);
  let router = record_routes::<S, LoreEntry>(router);
  let router = record_routes::<S, Note>(router);
  let router = record_routes::<S, Race>(router);
  let router = record_routes::<S, Relationship>(router);

  router.with_state(state)
}
