//! SQL schema for the Mythos SQLite store.
//!
//! Column names match the serialised field names of the `mythos-core` record
//! types one-to-one; the store reads and writes rows through that mapping.
//!
//! Junction rows, spells and every project-scoped table cascade through
//! foreign keys. Relationships point at `(type, id)` pairs and cannot, so the
//! store purges them explicitly. The activity log and upload claims have no
//! foreign keys at all.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    id          TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL,
    name        TEXT NOT NULL,
    description TEXT,
    genre       TEXT,
    image_url   TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS characters (
    id          TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    title       TEXT,
    role        TEXT,
    race        TEXT,
    age         TEXT,
    affiliation TEXT,
    description TEXT,
    image_url   TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS locations (
    id            TEXT PRIMARY KEY,
    project_id    TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name          TEXT NOT NULL,
    location_type TEXT,
    region        TEXT,
    climate       TEXT,
    population    TEXT,
    description   TEXT,
    image_url     TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id           TEXT PRIMARY KEY,
    project_id   TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title        TEXT NOT NULL,
    event_type   TEXT,
    year         INTEGER,
    month        INTEGER,
    day          INTEGER,
    significance TEXT,
    description  TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS magic_systems (
    id          TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    source      TEXT,
    cost        TEXT,
    limitations TEXT,
    description TEXT,
    image_url   TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS spells (
    id              TEXT PRIMARY KEY,
    project_id      TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    magic_system_id TEXT REFERENCES magic_systems(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    school          TEXT,
    level           INTEGER,
    casting_time    TEXT,
    "range"         TEXT,
    components      TEXT,
    effect          TEXT,
    description     TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lore_entries (
    id         TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title      TEXT NOT NULL,
    category   TEXT,
    content    TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id         TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title      TEXT NOT NULL,
    category   TEXT,
    content    TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS races (
    id          TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    lifespan    TEXT,
    homeland    TEXT,
    traits      TEXT,
    description TEXT,
    image_url   TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Endpoints are (entity kind, id) pairs: no foreign keys possible.
CREATE TABLE IF NOT EXISTS relationships (
    id                TEXT PRIMARY KEY,
    project_id        TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    source_type       TEXT NOT NULL,
    source_id         TEXT NOT NULL,
    target_type       TEXT NOT NULL,
    target_id         TEXT NOT NULL,
    relationship_type TEXT NOT NULL,
    strength          INTEGER CHECK (strength BETWEEN 1 AND 10),
    description       TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    CHECK (NOT (source_type = target_type AND source_id = target_id))
);

CREATE TABLE IF NOT EXISTS character_spells (
    character_id TEXT NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
    spell_id     TEXT NOT NULL REFERENCES spells(id) ON DELETE CASCADE,
    proficiency  TEXT,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (character_id, spell_id)
);

CREATE TABLE IF NOT EXISTS event_characters (
    event_id     TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    character_id TEXT NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
    role         TEXT,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (event_id, character_id)
);

-- Outlives whatever it describes.
CREATE TABLE IF NOT EXISTS activity_log (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    project_id  TEXT,
    action      TEXT NOT NULL,
    entity_kind TEXT,
    entity_id   TEXT,
    summary     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Who uploaded each stored image file. Files are content-addressed, so
-- several users can hold a claim on the same one.
CREATE TABLE IF NOT EXISTS uploads (
    name       TEXT NOT NULL,
    owner_id   TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (name, owner_id)
);

CREATE INDEX IF NOT EXISTS projects_owner_idx       ON projects(owner_id);
CREATE INDEX IF NOT EXISTS characters_project_idx   ON characters(project_id);
CREATE INDEX IF NOT EXISTS locations_project_idx    ON locations(project_id);
CREATE INDEX IF NOT EXISTS events_project_idx       ON events(project_id);
CREATE INDEX IF NOT EXISTS magic_systems_project_idx ON magic_systems(project_id);
CREATE INDEX IF NOT EXISTS spells_project_idx       ON spells(project_id);
CREATE INDEX IF NOT EXISTS spells_system_idx        ON spells(magic_system_id);
CREATE INDEX IF NOT EXISTS lore_project_idx         ON lore_entries(project_id);
CREATE INDEX IF NOT EXISTS notes_project_idx        ON notes(project_id);
CREATE INDEX IF NOT EXISTS races_project_idx        ON races(project_id);
CREATE INDEX IF NOT EXISTS relationships_project_idx ON relationships(project_id);
CREATE INDEX IF NOT EXISTS relationships_source_idx ON relationships(source_type, source_id);
CREATE INDEX IF NOT EXISTS relationships_target_idx ON relationships(target_type, target_id);
CREATE INDEX IF NOT EXISTS character_spells_spell_idx ON character_spells(spell_id);
CREATE INDEX IF NOT EXISTS event_characters_char_idx ON event_characters(character_id);
CREATE INDEX IF NOT EXISTS activity_project_idx     ON activity_log(project_id);

PRAGMA user_version = 2;
"#;
