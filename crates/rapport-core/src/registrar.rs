//! Identity Registrar: get-or-create for platforms and identities.
//!
//! Every producer goes through here before writing messages, so that there
//! is exactly one identity row per `(platform, id_string)`. The store has no
//! uniqueness constraint on that pair; the query-before-insert below is what
//! upholds it.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::{
  entity::{Identity, NewIdentity, Platform},
  store::MessageStore,
};

/// Get-or-create front end over a [`MessageStore`].
///
/// Keeps an index of every platform and identity it has returned. The index
/// is filled only from successful store reads or writes and lives as long as
/// the registrar, i.e. one ingestion run.
pub struct Registrar<'s, S> {
  store:              &'s S,
  platforms:          HashMap<String, Platform>,
  identities:         HashMap<(Uuid, String), Identity>,
  platforms_created:  usize,
  identities_created: usize,
}

impl<'s, S: MessageStore> Registrar<'s, S> {
  pub fn new(store: &'s S) -> Self {
    Self {
      store,
      platforms: HashMap::new(),
      identities: HashMap::new(),
      platforms_created: 0,
      identities_created: 0,
    }
  }

  pub fn platforms_created(&self) -> usize { self.platforms_created }

  pub fn identities_created(&self) -> usize { self.identities_created }

  /// Return the platform called `name`, creating it on first use.
  pub async fn get_or_create_platform(&mut self, name: &str) -> Result<Platform, S::Error> {
    if let Some(p) = self.platforms.get(name) {
      return Ok(p.clone());
    }

    let platform = match self.store.find_platform(name.to_owned()).await? {
      Some(p) => p,
      None => {
        let p = self.store.add_platform(name.to_owned()).await?;
        self.platforms_created += 1;
        debug!(platform = %p.name, "created platform");
        p
      }
    };

    self.platforms.insert(name.to_owned(), platform.clone());
    Ok(platform)
  }

  /// Return the identity for `(platform, id_string)`, creating it if absent.
  ///
  /// An existing identity is returned unchanged: the display name recorded
  /// first wins.
  pub async fn get_or_create_identity(
    &mut self,
    platform: &Platform,
    id_string: &str,
    display_name: Option<&str>,
  ) -> Result<Identity, S::Error> {
    if let Some(identity) = self.lookup(platform, id_string).await? {
      return Ok(identity);
    }

    let identity = self
      .store
      .add_identity(NewIdentity::new(
        platform.platform_id,
        id_string,
        display_name.map(str::to_owned),
      ))
      .await?;
    self.identities_created += 1;
    debug!(
      platform = %platform.name,
      id_string,
      display_name = identity.display_name(),
      "created identity"
    );

    self
      .identities
      .insert((platform.platform_id, id_string.to_owned()), identity.clone());
    Ok(identity)
  }

  /// Find an existing identity without creating one.
  pub async fn lookup(
    &mut self,
    platform: &Platform,
    id_string: &str,
  ) -> Result<Option<Identity>, S::Error> {
    let key = (platform.platform_id, id_string.to_owned());
    if let Some(identity) = self.identities.get(&key) {
      return Ok(Some(identity.clone()));
    }

    let found = self
      .store
      .find_identity(platform.platform_id, id_string.to_owned())
      .await?;
    if let Some(identity) = &found {
      self.identities.insert(key, identity.clone());
    }
    Ok(found)
  }
}
