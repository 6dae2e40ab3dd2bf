use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::entity::{EntityKind, User, UserId};
use crate::error::{IdeastormError, Result};

pub const DATA_DIR: &str = ".ideastorm";
pub const DB_FILE: &str = "ideastorm.db";

/// Site options that exist before anyone sets them
const OPTION_DEFAULTS: &[(&str, &str)] = &[
    ("site_title", "Ideastorm"),
    ("site_description", "An idea-generation platform"),
];

pub struct SqliteStore {
    pub(super) conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Create `.ideastorm/` under `root` with an empty database
    pub fn init(root: &Path) -> Result<Self> {
        let data_dir = root.join(DATA_DIR);

        if data_dir.exists() {
            return Err(IdeastormError::AlreadyInitialized);
        }

        fs::create_dir_all(&data_dir)?;
        let path = data_dir.join(DB_FILE);
        let store = Self {
            conn: Connection::open(&path)?,
            path,
        };
        store.init_schema()?;
        tracing::info!(path = %store.path.display(), "initialized project database");
        Ok(store)
    }

    /// Open the database of an initialized project
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(DATA_DIR).join(DB_FILE);

        if !path.exists() {
            return Err(IdeastormError::NotInitialized);
        }

        let store = Self {
            conn: Connection::open(&path)?,
            path,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory database, for tests and throwaway sessions
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                is_superuser INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS problems (
                id TEXT PRIMARY KEY,
                sequence_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT,
                author INTEGER NOT NULL,
                slug TEXT NOT NULL,
                public INTEGER NOT NULL,
                open INTEGER NOT NULL,
                published INTEGER NOT NULL,
                locked INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS problem_members (
                problem_id TEXT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                PRIMARY KEY (problem_id, user_id, role)
            );

            CREATE TABLE IF NOT EXISTS criteria (
                id TEXT PRIMARY KEY,
                sequence_number INTEGER NOT NULL,
                problem_id TEXT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
                parent_id TEXT,
                title TEXT NOT NULL,
                content TEXT,
                author INTEGER NOT NULL,
                format TEXT NOT NULL,
                weight INTEGER,
                result TEXT NOT NULL,
                sort_order TEXT NOT NULL,
                scale_min INTEGER,
                scale_max INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ideas (
                id TEXT PRIMARY KEY,
                sequence_number INTEGER NOT NULL,
                problem_id TEXT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                content TEXT,
                author INTEGER NOT NULL,
                deleted_by INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS alternatives (
                id TEXT PRIMARY KEY,
                sequence_number INTEGER NOT NULL,
                problem_id TEXT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                content TEXT,
                author INTEGER NOT NULL,
                position INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS alternative_ideas (
                alternative_id TEXT NOT NULL REFERENCES alternatives(id) ON DELETE CASCADE,
                idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                PRIMARY KEY (alternative_id, idea_id)
            );

            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                sequence_number INTEGER NOT NULL,
                problem_id TEXT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
                target_kind TEXT NOT NULL,
                target_id TEXT,
                content TEXT NOT NULL,
                author INTEGER NOT NULL,
                deleted_by INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS votes (
                author INTEGER NOT NULL,
                target_kind TEXT NOT NULL,
                target_id TEXT NOT NULL,
                weight INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (author, target_kind, target_id)
            );

            CREATE TABLE IF NOT EXISTS criteria_values (
                idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                criteria_id TEXT NOT NULL REFERENCES criteria(id) ON DELETE CASCADE,
                value INTEGER NOT NULL,
                PRIMARY KEY (idea_id, criteria_id)
            );

            CREATE TABLE IF NOT EXISTS quantifiers (
                id TEXT PRIMARY KEY,
                criteria_id TEXT NOT NULL REFERENCES criteria(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                format TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quantifier_values (
                quantifier_id TEXT NOT NULL REFERENCES quantifiers(id) ON DELETE CASCADE,
                idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
                value TEXT NOT NULL,
                PRIMARY KEY (quantifier_id, idea_id)
            );

            -- Append-only: rows are inserted and read, never updated
            CREATE TABLE IF NOT EXISTS revisions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_kind TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                author INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                updated TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_revisions_entity ON revisions(entity_id);

            CREATE TABLE IF NOT EXISTS options (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // Users

    pub fn add_user(&self, username: &str, is_superuser: bool) -> Result<User> {
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT id FROM users WHERE username = ?1", [username], |row| row.get(0))
            .optional()?;
        if exists.is_some() {
            return Err(IdeastormError::InvalidArgument(format!(
                "user '{}' already exists",
                username
            )));
        }

        self.conn.execute(
            "INSERT INTO users (username, is_superuser, created_at) VALUES (?1, ?2, ?3)",
            params![username, is_superuser, timestamp(&Utc::now())],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(user = id, username, is_superuser, "user added");

        let user = User::new(id, username);
        Ok(User { is_superuser, ..user })
    }

    pub fn get_user(&self, username: &str) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, username, is_superuser FROM users WHERE username = ?1",
                [username],
                user_from_row,
            )
            .optional()?
            .ok_or_else(|| IdeastormError::UserNotFound(username.to_string()))
    }

    pub fn get_user_by_id(&self, id: UserId) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, username, is_superuser FROM users WHERE id = ?1",
                [id],
                user_from_row,
            )
            .optional()?
            .ok_or_else(|| IdeastormError::UserNotFound(id.to_string()))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username, is_superuser FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Display name for a user id; unknown ids render as `#<id>`
    pub fn username(&self, id: UserId) -> Result<String> {
        let name: Option<String> = self
            .conn
            .query_row("SELECT username FROM users WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(name.unwrap_or_else(|| format!("#{}", id)))
    }

    // Site options and activity counters

    pub fn get_option(&self, name: &str) -> Result<Option<String>> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM options WHERE name = ?1", [name], |row| row.get(0))
            .optional()?;
        Ok(value.or_else(|| {
            OPTION_DEFAULTS
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, default)| default.to_string())
        }))
    }

    pub fn set_option(&self, name: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO options (name, value) VALUES (?1, ?2)",
            params![name, value],
        )?;
        Ok(())
    }

    /// Unread activity count for a user
    pub fn activity_counter(&self, user: UserId) -> Result<u64> {
        let raw = self.get_option(&counter_key(user))?;
        Ok(raw.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    pub fn reset_activity_counter(&self, user: UserId) -> Result<()> {
        self.set_option(&counter_key(user), "0")
    }

    /// Bump the activity counter of each of `users`
    pub(super) fn bump_activity_counters(&self, users: impl IntoIterator<Item = UserId>) -> Result<()> {
        for user in users {
            let count = self.activity_counter(user)?;
            self.set_option(&counter_key(user), &(count + 1).to_string())?;
        }
        Ok(())
    }

    // Identifiers

    /// Next free sequence number for an entity kind
    pub fn next_sequence_number(&self, kind: EntityKind) -> Result<u32> {
        let sql = format!("SELECT COALESCE(MAX(sequence_number), 0) FROM {}", table(kind));
        let current: u32 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(current + 1)
    }

    /// Resolve a user-supplied id: a sequence number like `3` or a UUID
    /// prefix like `a1b2c`
    pub fn resolve_id(&self, kind: EntityKind, raw: &str) -> Result<Uuid> {
        let raw = raw.trim();
        if let Ok(seq) = raw.parse::<u32>() {
            let sql = format!("SELECT id FROM {} WHERE sequence_number = ?1", table(kind));
            let id: Option<String> = self.conn.query_row(&sql, [seq], |row| row.get(0)).optional()?;
            if let Some(id) = id {
                return parse_uuid(&id);
            }
        }

        let sql = format!("SELECT id FROM {} WHERE id LIKE ?1 || '%' LIMIT 2", table(kind));
        let mut stmt = self.conn.prepare(&sql)?;
        let matches = stmt
            .query_map([raw.to_lowercase()], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match matches.as_slice() {
            [] => Err(IdeastormError::EntityNotFound(format!("{} {}", kind, raw))),
            [id] => parse_uuid(id),
            _ => Err(IdeastormError::InvalidArgument(format!(
                "ambiguous {} id '{}'",
                kind, raw
            ))),
        }
    }
}

pub(super) fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Problem => "problems",
        EntityKind::Criteria => "criteria",
        EntityKind::Idea => "ideas",
        EntityKind::Alternative => "alternatives",
        EntityKind::Comment => "comments",
    }
}

fn counter_key(user: UserId) -> String {
    format!("user_{}_activity_counter", user)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: UserId = row.get(0)?;
    let username: String = row.get(1)?;
    let is_superuser: bool = row.get(2)?;
    Ok(User {
        is_superuser,
        ..User::new(id, username)
    })
}

/// Stored timestamp format. Fixed width with a `Z` suffix so text order is
/// time order.
pub(super) fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| IdeastormError::Storage(format!("bad id '{}': {}", raw, e)))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(IdeastormError::Storage(message)),
    )
}

pub(super) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e.to_string()))
}

pub(super) fn opt_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e.to_string())))
        .transpose()
}

pub(super) fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e.to_string()))
}

/// Read a column stored through `Display` back with `FromStr`
pub(super) fn parsed_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

impl From<rusqlite::Error> for IdeastormError {
    fn from(e: rusqlite::Error) -> Self {
        IdeastormError::Storage(format!("SQLite error: {}", e))
    }
}
