//! [`SqliteStore`] — the SQLite implementation of [`MessageStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};
use tracing::{debug, warn};
use uuid::Uuid;

use rapport_core::{
  entity::{Identity, Message, NewIdentity, NewMessage, NewPerson, Person, Platform},
  store::{IdentityQuery, MessageStore, StoreCounts},
  view::MessageView,
};

use crate::{
  Error, Result,
  encode::{
    IDENTITY_COLUMNS, PERSON_COLUMNS, PLATFORM_COLUMNS, RawIdentity, RawMessageView, RawParty,
    RawPerson, RawPlatform, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rapport store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT {IDENTITY_COLUMNS} …` with positional parameters.
  async fn query_identities(&self, sql: String, params: Vec<Value>) -> Result<Vec<Identity>> {
    let raws: Vec<RawIdentity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawIdentity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  async fn query_person(&self, sql: &'static str, param: String) -> Result<Option<Person>> {
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![param], RawPerson::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }
}

// ─── Query building ──────────────────────────────────────────────────────────

/// Translate an [`IdentityQuery`] into SQL plus positional parameters.
fn identity_query_sql(query: &IdentityQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<&'static str> = vec![];
  let mut params: Vec<Value> = vec![];

  if let Some(platform_id) = query.platform_id {
    conds.push("platform_id = ?");
    params.push(Value::Text(encode_uuid(platform_id)));
  }
  if let Some(id_string) = &query.id_string {
    conds.push("id_string = ?");
    params.push(Value::Text(id_string.clone()));
  }
  if let Some(display_name) = &query.display_name {
    conds.push("display_name = ?");
    params.push(Value::Text(display_name.clone()));
  }
  match query.linked {
    Some(true) => conds.push("person_id IS NOT NULL"),
    Some(false) => conds.push("person_id IS NULL"),
    None => {}
  }
  match query.named {
    Some(true) => conds.push("display_name IS NOT NULL AND display_name != ''"),
    Some(false) => conds.push("(display_name IS NULL OR display_name = '')"),
    None => {}
  }
  if let Some(exclude) = query.exclude {
    conds.push("identity_id != ?");
    params.push(Value::Text(encode_uuid(exclude)));
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  let limit_clause = match query.limit {
    Some(n) => {
      params.push(Value::Integer(n as i64));
      "LIMIT ?"
    }
    None => "",
  };

  (
    format!("SELECT {IDENTITY_COLUMNS} FROM identities {where_clause} ORDER BY rowid {limit_clause}"),
    params,
  )
}

// ─── MessageStore impl ───────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
  type Error = Error;

  // ── Platforms ─────────────────────────────────────────────────────────────

  async fn add_platform(&self, name: String) -> Result<Platform> {
    if self.find_platform(name.clone()).await?.is_some() {
      return Err(Error::DuplicatePlatform(name));
    }

    let platform = Platform {
      platform_id: Uuid::new_v4(),
      name,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(platform.platform_id);
    let name_str = platform.name.clone();
    let at_str   = encode_dt(platform.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO platforms (platform_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    debug!(name = %platform.name, id = %platform.platform_id, "created platform");
    Ok(platform)
  }

  async fn find_platform(&self, name: String) -> Result<Option<Platform>> {
    let raw: Option<RawPlatform> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PLATFORM_COLUMNS} FROM platforms WHERE name = ?1"),
              rusqlite::params![name],
              RawPlatform::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPlatform::into_platform).transpose()
  }

  async fn list_platforms(&self) -> Result<Vec<Platform>> {
    let raws: Vec<RawPlatform> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {PLATFORM_COLUMNS} FROM platforms ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawPlatform::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlatform::into_platform).collect()
  }

  // ── Identities ────────────────────────────────────────────────────────────

  async fn add_identity(&self, input: NewIdentity) -> Result<Identity> {
    let identity = Identity {
      identity_id:  Uuid::new_v4(),
      platform_id:  input.platform_id,
      id_string:    input.id_string,
      display_name: input.display_name,
      person_id:    None,
    };

    let id_str       = encode_uuid(identity.identity_id);
    let platform_str = encode_uuid(identity.platform_id);
    let id_string    = identity.id_string.clone();
    let display_name = identity.display_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (identity_id, platform_id, id_string, display_name, person_id)
           VALUES (?1, ?2, ?3, ?4, NULL)",
          rusqlite::params![id_str, platform_str, id_string, display_name],
        )?;
        Ok(())
      })
      .await?;

    Ok(identity)
  }

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    let query = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE identity_id = ?");
    let rows = self
      .query_identities(query, vec![Value::Text(encode_uuid(id))])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn find_identity(&self, platform_id: Uuid, id_string: String) -> Result<Option<Identity>> {
    let query = IdentityQuery {
      platform_id: Some(platform_id),
      id_string: Some(id_string),
      limit: Some(1),
      ..Default::default()
    };
    Ok(self.list_identities(&query).await?.into_iter().next())
  }

  async fn list_identities(&self, query: &IdentityQuery) -> Result<Vec<Identity>> {
    let (sql, params) = identity_query_sql(query);
    self.query_identities(sql, params).await
  }

  async fn link_identity(&self, identity_id: Uuid, person_id: Uuid) -> Result<()> {
    if self.get_person(person_id).await?.is_none() {
      return Err(Error::PersonNotFound(person_id));
    }

    let identity_str = encode_uuid(identity_id);
    let person_str   = encode_uuid(person_id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET person_id = ?1 WHERE identity_id = ?2",
          rusqlite::params![person_str, identity_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::IdentityNotFound(identity_id));
    }
    debug!(identity = %identity_id, person = %person_id, "linked identity");
    Ok(())
  }

  // ── People ────────────────────────────────────────────────────────────────

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let person = Person {
      person_id:  Uuid::new_v4(),
      name:       input.name,
      is_self:    input.is_self,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(person.person_id);
    let name_str = person.name.clone();
    let is_self  = person.is_self;
    let at_str   = encode_dt(person.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (person_id, name, is_self, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name_str, is_self, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    self
      .query_person(
        "SELECT person_id, name, is_self, created_at FROM people WHERE person_id = ?1",
        encode_uuid(id),
      )
      .await
  }

  async fn find_person_by_name(&self, name: String) -> Result<Option<Person>> {
    self
      .query_person(
        "SELECT person_id, name, is_self, created_at FROM people
         WHERE name = ?1 ORDER BY rowid LIMIT 1",
        name,
      )
      .await
  }

  async fn list_people(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn add_message(&self, input: NewMessage) -> Result<Message> {
    let message = Message {
      message_id:   Uuid::new_v4(),
      sender_id:    input.sender_id,
      recipient_id: input.recipient_id,
      fingerprint:  input.fingerprint(),
      text:         input.text,
      timestamp:    input.timestamp,
    };

    let id_str          = encode_uuid(message.message_id);
    let sender_str      = encode_uuid(message.sender_id);
    let recipient_str   = encode_uuid(message.recipient_id);
    let text            = message.text.clone();
    let timestamp_str   = encode_dt(message.timestamp);
    let fingerprint_str = message.fingerprint.clone();

    // Both parties must be existing identity rows; report which one is not.
    let missing: Option<String> = self
      .conn
      .call(move |conn| {
        for party in [&sender_str, &recipient_str] {
          let exists = conn
            .query_row(
              "SELECT 1 FROM identities WHERE identity_id = ?1",
              rusqlite::params![party],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !exists {
            return Ok(Some(party.clone()));
          }
        }

        conn.execute(
          "INSERT INTO messages (
             message_id, sender_id, recipient_id, message_text, timestamp, fingerprint
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            sender_str,
            recipient_str,
            text,
            timestamp_str,
            fingerprint_str,
          ],
        )?;
        Ok(None)
      })
      .await?;

    if let Some(missing) = missing {
      warn!(message = %message.message_id, identity = %missing, "message refers to a missing identity");
      return Err(Error::IdentityNotFound(Uuid::parse_str(&missing)?));
    }
    Ok(message)
  }

  async fn message_exists(&self, fingerprint: String) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM messages WHERE fingerprint = ?1 LIMIT 1",
              rusqlite::params![fingerprint],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn list_message_views(&self) -> Result<Vec<MessageView>> {
    let raws: Vec<RawMessageView> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             m.message_id, p.name, m.timestamp, m.message_text,
             s.identity_id, s.id_string, s.display_name, sp.person_id, sp.name, sp.is_self,
             r.identity_id, r.id_string, r.display_name, rp.person_id, rp.name, rp.is_self
           FROM messages m
           JOIN identities s  ON s.identity_id  = m.sender_id
           JOIN identities r  ON r.identity_id  = m.recipient_id
           JOIN platforms  p  ON p.platform_id  = s.platform_id
           LEFT JOIN people sp ON sp.person_id  = s.person_id
           LEFT JOIN people rp ON rp.person_id  = r.person_id
           ORDER BY m.rowid",
        )?;

        let rows = stmt
          .query_map([], |row| {
            Ok(RawMessageView {
              message_id: row.get(0)?,
              platform:   row.get(1)?,
              timestamp:  row.get(2)?,
              text:       row.get(3)?,
              sender:     RawParty::from_row(row, 4)?,
              recipient:  RawParty::from_row(row, 10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessageView::into_view).collect()
  }

  async fn counts(&self) -> Result<StoreCounts> {
    let counts = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM platforms),
             (SELECT COUNT(*) FROM identities),
             (SELECT COUNT(*) FROM identities WHERE person_id IS NOT NULL),
             (SELECT COUNT(*) FROM people),
             (SELECT COUNT(*) FROM messages)",
          [],
          |row| {
            Ok(StoreCounts {
              platforms:         row.get::<_, i64>(0)? as usize,
              identities:        row.get::<_, i64>(1)? as usize,
              linked_identities: row.get::<_, i64>(2)? as usize,
              people:            row.get::<_, i64>(3)? as usize,
              messages:          row.get::<_, i64>(4)? as usize,
            })
          },
        )?)
      })
      .await?;
    Ok(counts)
  }
}
