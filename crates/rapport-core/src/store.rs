//! The `MessageStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `rapport-store-sqlite`).
//! The registrar, writer and resolver depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  entity::{Identity, Message, NewIdentity, NewMessage, NewPerson, Person, Platform},
  view::MessageView,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Exact-match filters for [`MessageStore::list_identities`].
///
/// Unset fields do not filter. Results come back in insertion order.
#[derive(Debug, Clone, Default)]
pub struct IdentityQuery {
  pub platform_id:  Option<Uuid>,
  pub id_string:    Option<String>,
  pub display_name: Option<String>,
  /// `Some(true)`: person assigned; `Some(false)`: no person.
  pub linked:       Option<bool>,
  /// `Some(true)`: display name present and non-empty.
  pub named:        Option<bool>,
  /// Leave this identity out of the results.
  pub exclude:      Option<Uuid>,
  pub limit:        Option<usize>,
}

/// Row counts per entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
  pub platforms:         usize,
  pub identities:        usize,
  pub linked_identities: usize,
  pub people:            usize,
  pub messages:          usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a rapport store backend.
///
/// Every mutation is visible to the next query. The only in-place update is
/// [`link_identity`](Self::link_identity); nothing is ever deleted.
pub trait MessageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Platforms ─────────────────────────────────────────────────────────

  /// Create a platform. Fails if the name is already taken.
  fn add_platform(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Platform, Self::Error>> + Send + '_;

  fn find_platform(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Platform>, Self::Error>> + Send + '_;

  fn list_platforms(
    &self,
  ) -> impl Future<Output = Result<Vec<Platform>, Self::Error>> + Send + '_;

  // ── Identities ────────────────────────────────────────────────────────

  /// Insert an unlinked identity.
  ///
  /// Does not check for an existing `(platform, id_string)` row; callers go
  /// through the [`Registrar`](crate::registrar::Registrar).
  fn add_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// The first identity (in insertion order) with this exact key.
  fn find_identity(
    &self,
    platform_id: Uuid,
    id_string: String,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  fn list_identities<'a>(
    &'a self,
    query: &'a IdentityQuery,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + 'a;

  /// Point an identity at a person.
  fn link_identity(
    &self,
    identity_id: Uuid,
    person_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── People ────────────────────────────────────────────────────────────

  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// The first person (in insertion order) with exactly this name.
  fn find_person_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn list_people(&self) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Append a message. Fails if either identity does not exist.
  fn add_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Whether a message with this fingerprint was already stored.
  fn message_exists(
    &self,
    fingerprint: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every message joined with its platform and both parties, oldest row
  /// first.
  fn list_message_views(
    &self,
  ) -> impl Future<Output = Result<Vec<MessageView>, Self::Error>> + Send + '_;

  fn counts(&self) -> impl Future<Output = Result<StoreCounts, Self::Error>> + Send + '_;
}
