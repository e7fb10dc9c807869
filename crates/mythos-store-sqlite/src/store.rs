//! [`SqliteStore`]: the SQLite implementation of [`WorldStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, Params, params, types::Value as SqlValue};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use mythos_core::{
  Entity, EntityKind, Reference,
  activity::{ActivityEntry, NewActivity},
  link::{CharacterSpell, EventCharacter, Relationship},
  project::{NewProject, Project, ProjectPatch, ProjectStats},
  store::WorldStore,
  validate::Validate as _,
  world::Character,
};

use crate::{
  Result,
  encode::{RawRow, decode, decode_all, encode_uuid, query_json},
  schema::SCHEMA,
};

type CoreError = mythos_core::Error;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Mythos world store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
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

  /// Run a read-only query and decode every row.
  async fn fetch<T: DeserializeOwned>(&self, sql: String, params: Vec<SqlValue>) -> Result<Vec<T>> {
    let rows = self
      .conn
      .call(move |conn| Ok(query_json(conn, &sql, rusqlite::params_from_iter(params))?))
      .await?;
    decode_all(rows)
  }

  async fn fetch_one<T: DeserializeOwned>(&self, sql: String, params: Vec<SqlValue>) -> Result<Option<T>> {
    Ok(self.fetch(sql, params).await?.into_iter().next())
  }

  /// Overwrite a whole row, returning whether it still existed.
  async fn overwrite(&self, table: &'static str, id: Uuid, row: RawRow) -> Result<bool> {
    let id = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| Ok(row.update(conn, table, &id)?))
      .await?;
    Ok(n > 0)
  }
}

fn text(id: Uuid) -> SqlValue { SqlValue::Text(encode_uuid(id)) }

fn exists<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, params, |_| Ok(())).optional()?.is_some())
}

/// The project must exist and every reference must live in it.
fn check_scope(
  conn: &Connection,
  project_id: Uuid,
  refs: &[Reference],
) -> rusqlite::Result<mythos_core::Result<()>> {
  let pid = encode_uuid(project_id);
  if !exists(conn, "SELECT 1 FROM projects WHERE id = ?1", [&pid])? {
    return Ok(Err(CoreError::ProjectNotFound(project_id)));
  }
  for r in refs {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1 AND project_id = ?2", r.kind.table());
    if !exists(conn, &sql, params![encode_uuid(r.id), pid])? {
      return Ok(Err(CoreError::DanglingReference { kind: r.kind, id: r.id, project_id }));
    }
  }
  Ok(Ok(()))
}

/// Both ends of a junction row must exist in the same project.
fn check_pair(conn: &Connection, left: Reference, right: Reference) -> rusqlite::Result<mythos_core::Result<()>> {
  let mut projects = Vec::with_capacity(2);
  for r in [left, right] {
    let project: Option<String> = conn
      .query_row(
        &format!("SELECT project_id FROM {} WHERE id = ?1", r.kind.table()),
        [encode_uuid(r.id)],
        |row| row.get(0),
      )
      .optional()?;
    match project {
      Some(p) => projects.push(p),
      None => return Ok(Err(CoreError::not_found(r.kind, r.id))),
    }
  }
  if projects[0] != projects[1] {
    return Ok(Err(CoreError::invalid(
      "project_id",
      format!("{} and {} belong to different projects", left.kind, right.kind),
    )));
  }
  Ok(Ok(()))
}

/// Any row whose image URL or rich text mentions `?1`. A textual mention is
/// enough to keep a file alive.
const IMAGE_MENTIONS: &str = "
  SELECT 1 FROM projects      WHERE instr(image_url, ?1) OR instr(description, ?1)
  UNION ALL
  SELECT 1 FROM characters    WHERE instr(image_url, ?1) OR instr(description, ?1)
  UNION ALL
  SELECT 1 FROM locations     WHERE instr(image_url, ?1) OR instr(description, ?1)
  UNION ALL
  SELECT 1 FROM events        WHERE instr(description, ?1)
  UNION ALL
  SELECT 1 FROM magic_systems WHERE instr(image_url, ?1) OR instr(description, ?1)
  UNION ALL
  SELECT 1 FROM spells        WHERE instr(description, ?1)
  UNION ALL
  SELECT 1 FROM lore_entries  WHERE instr(content, ?1)
  UNION ALL
  SELECT 1 FROM notes         WHERE instr(content, ?1)
  UNION ALL
  SELECT 1 FROM races         WHERE instr(image_url, ?1) OR instr(description, ?1)
  LIMIT 1";

// ─── WorldStore impl ─────────────────────────────────────────────────────────

impl WorldStore for SqliteStore {
  type Error = crate::Error;

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn create_project(&self, owner_id: String, input: NewProject) -> Result<Project> {
    input.validate()?;
    let project = Project::new(Uuid::new_v4(), owner_id, input, Utc::now());
    let row = RawRow::encode(&project)?;

    self
      .conn
      .call(move |conn| Ok(row.insert(conn, EntityKind::Project.table())?))
      .await?;

    Ok(project)
  }

  async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
    self
      .fetch_one("SELECT * FROM projects WHERE id = ?1".into(), vec![text(id)])
      .await
  }

  async fn list_projects<'a>(&'a self, owner_id: &'a str) -> Result<Vec<Project>> {
    self
      .fetch(
        "SELECT * FROM projects WHERE owner_id = ?1 ORDER BY rowid".into(),
        vec![SqlValue::Text(owner_id.to_owned())],
      )
      .await
  }

  async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> Result<Option<Project>> {
    patch.validate()?;
    let Some(mut project) = self.get_project(id).await? else {
      return Ok(None);
    };
    project.apply(patch, Utc::now());
    let row = RawRow::encode(&project)?;
    let found = self.overwrite(EntityKind::Project.table(), id, row).await?;
    Ok(found.then_some(project))
  }

  async fn delete_project(&self, id: Uuid) -> Result<bool> {
    let id = encode_uuid(id);
    // Every owned table cascades from `projects`, relationships included.
    let n = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM projects WHERE id = ?1", [id])?))
      .await?;
    Ok(n > 0)
  }

  async fn project_stats(&self, id: Uuid) -> Result<ProjectStats> {
    let pid = encode_uuid(id);

    let counts: Option<Vec<(EntityKind, u64)>> = self
      .conn
      .call(move |conn| {
        if !exists(conn, "SELECT 1 FROM projects WHERE id = ?1", [&pid])? {
          return Ok(None);
        }
        let mut counts = Vec::with_capacity(EntityKind::LEAVES.len());
        for kind in EntityKind::LEAVES {
          let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE project_id = ?1", kind.table()),
            [&pid],
            |row| row.get(0),
          )?;
          counts.push((kind, n.unsigned_abs()));
        }
        Ok(Some(counts))
      })
      .await?;

    let counts = counts.ok_or(CoreError::ProjectNotFound(id))?;
    Ok(ProjectStats { project_id: id, counts: counts.into_iter().collect() })
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn create<E: Entity>(&self, draft: E::Draft) -> Result<E> {
    draft.validate()?;
    let record = E::from_draft(Uuid::new_v4(), draft, Utc::now());
    let project_id = record.project_id();
    let refs = record.references();
    let row = RawRow::encode(&record)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = check_scope(&tx, project_id, &refs)? {
          return Ok(Err(e));
        }
        row.insert(&tx, E::KIND.table())?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(record)
  }

  async fn get<E: Entity>(&self, id: Uuid) -> Result<Option<E>> {
    let sql = format!("SELECT * FROM {} WHERE id = ?1", E::KIND.table());
    self.fetch_one(sql, vec![text(id)]).await
  }

  async fn list<E: Entity>(&self, project_id: Uuid) -> Result<Vec<E>> {
    let sql = format!(
      "SELECT * FROM {} WHERE project_id = ?1 ORDER BY rowid",
      E::KIND.table()
    );
    self.fetch(sql, vec![text(project_id)]).await
  }

  async fn update<E: Entity>(&self, id: Uuid, patch: E::Patch) -> Result<Option<E>> {
    patch.validate()?;
    let Some(mut record) = self.get::<E>(id).await? else {
      return Ok(None);
    };
    record.apply(patch, Utc::now());

    let project_id = record.project_id();
    let refs = record.references();
    let row = RawRow::encode(&record)?;
    let id_str = encode_uuid(id);

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = check_scope(&tx, project_id, &refs)? {
          return Ok(Err(e));
        }
        let n = row.update(&tx, E::KIND.table(), &id_str)?;
        tx.commit()?;
        Ok(Ok(n > 0))
      })
      .await??;

    Ok(found.then_some(record))
  }

  async fn delete<E: Entity>(&self, id: Uuid) -> Result<Option<E>> {
    let kind = E::KIND;
    let id_str = encode_uuid(id);

    let row = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let select = format!("SELECT * FROM {} WHERE id = ?1", kind.table());
        let Some(row) = query_json(&tx, &select, [&id_str])?.into_iter().next() else {
          return Ok(None);
        };

        // Junction rows and a system's spells go by foreign key; edges
        // touching any of them have to be purged by hand.
        if kind == EntityKind::MagicSystem {
          tx.execute(
            "DELETE FROM relationships
             WHERE (source_type = ?1 AND source_id IN (SELECT id FROM spells WHERE magic_system_id = ?2))
                OR (target_type = ?1 AND target_id IN (SELECT id FROM spells WHERE magic_system_id = ?2))",
            params![EntityKind::Spell.to_string(), id_str],
          )?;
        }
        if kind != EntityKind::Relationship {
          tx.execute(
            "DELETE FROM relationships
             WHERE (source_type = ?1 AND source_id = ?2)
                OR (target_type = ?1 AND target_id = ?2)",
            params![kind.to_string(), id_str],
          )?;
        }
        tx.execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), [&id_str])?;
        tx.commit()?;
        Ok(Some(row))
      })
      .await?;

    row.map(decode).transpose()
  }

  // ── Junctions ─────────────────────────────────────────────────────────────

  async fn link_spell(
    &self,
    character_id: Uuid,
    spell_id:     Uuid,
    proficiency:  Option<String>,
  ) -> Result<CharacterSpell> {
    let link = CharacterSpell { character_id, spell_id, proficiency, created_at: Utc::now() };
    let row = RawRow::encode(&link)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let pair = check_pair(
          &tx,
          Reference { kind: EntityKind::Character, id: character_id },
          Reference { kind: EntityKind::Spell, id: spell_id },
        )?;
        if let Err(e) = pair {
          return Ok(Err(e));
        }
        if exists(
          &tx,
          "SELECT 1 FROM character_spells WHERE character_id = ?1 AND spell_id = ?2",
          params![encode_uuid(character_id), encode_uuid(spell_id)],
        )? {
          return Ok(Err(CoreError::AlreadyLinked { left: character_id, right: spell_id }));
        }
        row.insert(&tx, "character_spells")?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(link)
  }

  async fn unlink_spell(&self, character_id: Uuid, spell_id: Uuid) -> Result<bool> {
    let (c, s) = (encode_uuid(character_id), encode_uuid(spell_id));
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM character_spells WHERE character_id = ?1 AND spell_id = ?2",
          params![c, s],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn spells_of_character(&self, character_id: Uuid) -> Result<Vec<CharacterSpell>> {
    self
      .fetch(
        "SELECT * FROM character_spells WHERE character_id = ?1 ORDER BY rowid".into(),
        vec![text(character_id)],
      )
      .await
  }

  async fn link_event_character(
    &self,
    event_id:     Uuid,
    character_id: Uuid,
    role:         Option<String>,
  ) -> Result<EventCharacter> {
    let link = EventCharacter { event_id, character_id, role, created_at: Utc::now() };
    let row = RawRow::encode(&link)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let pair = check_pair(
          &tx,
          Reference { kind: EntityKind::Event, id: event_id },
          Reference { kind: EntityKind::Character, id: character_id },
        )?;
        if let Err(e) = pair {
          return Ok(Err(e));
        }
        if exists(
          &tx,
          "SELECT 1 FROM event_characters WHERE event_id = ?1 AND character_id = ?2",
          params![encode_uuid(event_id), encode_uuid(character_id)],
        )? {
          return Ok(Err(CoreError::AlreadyLinked { left: event_id, right: character_id }));
        }
        row.insert(&tx, "event_characters")?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(link)
  }

  async fn unlink_event_character(&self, event_id: Uuid, character_id: Uuid) -> Result<bool> {
    let (e, c) = (encode_uuid(event_id), encode_uuid(character_id));
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM event_characters WHERE event_id = ?1 AND character_id = ?2",
          params![e, c],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn characters_of_event(&self, event_id: Uuid) -> Result<Vec<EventCharacter>> {
    self
      .fetch(
        "SELECT * FROM event_characters WHERE event_id = ?1 ORDER BY rowid".into(),
        vec![text(event_id)],
      )
      .await
  }

  async fn events_of_character(&self, character_id: Uuid) -> Result<Vec<EventCharacter>> {
    self
      .fetch(
        "SELECT * FROM event_characters WHERE character_id = ?1 ORDER BY rowid".into(),
        vec![text(character_id)],
      )
      .await
  }

  async fn characters_using_magic_system(&self, magic_system_id: Uuid) -> Result<Vec<Character>> {
    self
      .fetch(
        "SELECT * FROM characters WHERE id IN (
           SELECT cs.character_id FROM character_spells cs
           JOIN spells s ON s.id = cs.spell_id
           WHERE s.magic_system_id = ?1
         ) ORDER BY rowid"
          .into(),
        vec![text(magic_system_id)],
      )
      .await
  }

  async fn relationships_of(&self, kind: EntityKind, id: Uuid) -> Result<Vec<Relationship>> {
    self
      .fetch(
        "SELECT * FROM relationships
         WHERE (source_type = ?1 AND source_id = ?2)
            OR (target_type = ?1 AND target_id = ?2)
         ORDER BY rowid"
          .into(),
        vec![SqlValue::Text(kind.to_string()), text(id)],
      )
      .await
  }

  // ── Activity ──────────────────────────────────────────────────────────────

  async fn record_activity(&self, input: NewActivity) -> Result<ActivityEntry> {
    let entry = ActivityEntry::new(Uuid::new_v4(), input, Utc::now());
    let row = RawRow::encode(&entry)?;
    self
      .conn
      .call(move |conn| Ok(row.insert(conn, "activity_log")?))
      .await?;
    Ok(entry)
  }

  async fn list_activity(&self, project_id: Uuid, limit: usize) -> Result<Vec<ActivityEntry>> {
    self
      .fetch(
        "SELECT * FROM activity_log WHERE project_id = ?1 ORDER BY rowid DESC LIMIT ?2".into(),
        vec![text(project_id), SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX))],
      )
      .await
  }

  // ── Uploads ───────────────────────────────────────────────────────────────

  async fn claim_upload(&self, owner_id: String, name: String) -> Result<()> {
    let at = Utc::now().to_rfc3339();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO uploads (name, owner_id, created_at) VALUES (?1, ?2, ?3)",
          params![name, owner_id, at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn release_upload<'a>(&'a self, owner_id: &'a str, name: &'a str) -> Result<bool> {
    let (owner, name) = (owner_id.to_owned(), name.to_owned());
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM uploads WHERE name = ?1 AND owner_id = ?2", params![name, owner])?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn upload_claimed<'a>(&'a self, name: &'a str) -> Result<bool> {
    let name = name.to_owned();
    Ok(
      self
        .conn
        .call(move |conn| Ok(exists(conn, "SELECT 1 FROM uploads WHERE name = ?1", [name])?))
        .await?,
    )
  }

  async fn image_referenced<'a>(&'a self, name: &'a str) -> Result<bool> {
    let name = name.to_owned();
    Ok(
      self
        .conn
        .call(move |conn| Ok(exists(conn, IMAGE_MENTIONS, [name])?))
        .await?,
    )
  }
}
