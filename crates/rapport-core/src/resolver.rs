//! Identity Resolver: links identities to people after ingestion.
//!
//! Two ordered phases over the whole store:
//!
//! - **Phase A** turns every identity whose display name looks like a human
//!   name into a [`Person`] of that exact name (reusing one if it exists) and
//!   links the identity to it. Identities already linked are left alone.
//! - **Phase B** links every identity still without a person to the person of
//!   the first *other* identity that shares its `id_string` and already has
//!   one. Identities with no such twin stay unlinked.
//!
//! Matching is on exact strings only. Two different people with the same
//! display name end up as one person, and an identity whose only connection
//! to a named identity goes through a third unlinked identity is not merged.
//!
//! One pass is enough: Phase B links only on `id_string`, so an identity it
//! links shares that `id_string` with an identity linked before it, and a
//! second sweep would find nothing new.
//!
//! Both phases are idempotent. A pass aborted by a store error can be re-run.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
  entity::{Identity, NewPerson, Person},
  normalize::is_plausible_name,
  store::{IdentityQuery, MessageStore},
};

// ─── Options & report ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
  /// People created under one of these names are flagged as the archive
  /// owner.
  pub owner_names: Vec<String>,
}

/// Counters for one resolver pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
  /// Phase A: new people.
  pub people_created:      usize,
  /// Phase A: identities attached to a person by display name.
  pub linked_by_name:      usize,
  /// Phase B: identities attached through a twin `id_string`.
  pub linked_by_id_string: usize,
  /// Identities left without a person.
  pub unlinked:            usize,
}

impl fmt::Display for ResolveReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "people created:       {}", self.people_created)?;
    writeln!(f, "linked by name:       {}", self.linked_by_name)?;
    writeln!(f, "linked by id string:  {}", self.linked_by_id_string)?;
    write!(f, "left unlinked:        {}", self.unlinked)
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

pub struct Resolver<'s, S> {
  store:   &'s S,
  options: ResolveOptions,
}

impl<'s, S: MessageStore> Resolver<'s, S> {
  pub fn new(store: &'s S, options: ResolveOptions) -> Self { Self { store, options } }

  /// Run Phase A then Phase B.
  pub async fn run(&self) -> Result<ResolveReport, S::Error> {
    let mut report = ResolveReport::default();
    self.link_by_name(&mut report).await?;
    self.link_by_id_string(&mut report).await?;
    info!(
      people_created = report.people_created,
      linked_by_name = report.linked_by_name,
      linked_by_id_string = report.linked_by_id_string,
      unlinked = report.unlinked,
      "identity resolution finished"
    );
    Ok(report)
  }

  /// Phase A.
  pub async fn link_by_name(&self, report: &mut ResolveReport) -> Result<(), S::Error> {
    let named = self
      .store
      .list_identities(&IdentityQuery { named: Some(true), ..Default::default() })
      .await?;

    for identity in named {
      let name = identity.display_name();
      if identity.is_linked() || !is_plausible_name(name) {
        continue;
      }

      let person = self.person_named(name, report).await?;
      self
        .store
        .link_identity(identity.identity_id, person.person_id)
        .await?;
      report.linked_by_name += 1;
    }
    Ok(())
  }

  /// Phase B.
  pub async fn link_by_id_string(&self, report: &mut ResolveReport) -> Result<(), S::Error> {
    let unlinked = self
      .store
      .list_identities(&IdentityQuery { linked: Some(false), ..Default::default() })
      .await?;

    for identity in unlinked {
      match self.twin_of(&identity).await? {
        Some(twin) => {
          if let Some(person_id) = twin.person_id {
            debug!(
              id_string = %identity.id_string,
              twin = %twin.identity_id,
              "linked through shared id string"
            );
            self.store.link_identity(identity.identity_id, person_id).await?;
            report.linked_by_id_string += 1;
          }
        }
        None => report.unlinked += 1,
      }
    }
    Ok(())
  }

  /// Existing person with exactly this name, or a new one.
  async fn person_named(
    &self,
    name: &str,
    report: &mut ResolveReport,
  ) -> Result<Person, S::Error> {
    if let Some(person) = self.store.find_person_by_name(name.to_owned()).await? {
      return Ok(person);
    }

    let is_self = self.options.owner_names.iter().any(|n| n == name);
    let person = self
      .store
      .add_person(NewPerson { name: name.to_owned(), is_self })
      .await?;
    report.people_created += 1;
    debug!(name, is_self, "created person");
    Ok(person)
  }

  /// First other identity with the same `id_string` that has a person.
  async fn twin_of(&self, identity: &Identity) -> Result<Option<Identity>, S::Error> {
    let query = IdentityQuery {
      id_string: Some(identity.id_string.clone()),
      linked: Some(true),
      exclude: Some(identity.identity_id),
      limit: Some(1),
      ..Default::default()
    };
    Ok(self.store.list_identities(&query).await?.into_iter().next())
  }
}
