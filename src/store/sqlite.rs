use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use super::schema::SCHEMA;
use crate::client::NotebookClient;
use crate::error::{Error, Result};
use crate::types::*;

pub const DEFAULT_PRINCIPAL: &str = "local";

const CHECKPOINT_COLUMNS: &str =
    "c.id, c.notebook_id, c.name, c.description, c.path, c.created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    principal: String,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
            principal: DEFAULT_PRINCIPAL.to_string(),
        })
    }

    /// Principal recorded as the owner of notebooks created through this store.
    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = principal.into();
        self
    }

    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>> {
        let conn = self.conn();
        let checkpoint = conn
            .query_row(
                &format!("SELECT {CHECKPOINT_COLUMNS} FROM checkpoints c WHERE c.id = ?1"),
                params![id],
                checkpoint_from_row,
            )
            .optional()?;

        match checkpoint {
            Some(mut checkpoint) => {
                checkpoint.tags = load_tags(&conn, &checkpoint.id)?;
                Ok(Some(checkpoint))
            }
            None => Ok(None),
        }
    }

    /// Delete a notebook along with all of its checkpoints.
    pub fn delete_notebook(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM notebooks WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

fn parse_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn default_checkpoint_name(created_at: &DateTime<Utc>) -> String {
    created_at.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn notebook_name_from(source_path: &Path) -> Result<String> {
    source_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            Error::Validation(format!(
                "cannot derive a notebook name from {}",
                source_path.display()
            ))
        })
}

fn notebook_from_row(row: &Row<'_>) -> rusqlite::Result<NotebookRecord> {
    Ok(NotebookRecord {
        id: row.get(0)?,
        project: row.get(1)?,
        name: row.get(2)?,
        owner: row.get(3)?,
        created_at: parse_datetime(row, 4)?,
    })
}

fn checkpoint_from_row(row: &Row<'_>) -> rusqlite::Result<Checkpoint> {
    Ok(Checkpoint {
        id: row.get(0)?,
        notebook_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        path: row.get(4)?,
        tags: ValueSet::new(),
        created_at: parse_datetime(row, 5)?,
    })
}

fn load_tags(conn: &Connection, checkpoint_id: &str) -> Result<ValueSet> {
    let mut stmt = conn.prepare("SELECT tag FROM checkpoint_tags WHERE checkpoint_id = ?1")?;
    let rows = stmt.query_map(params![checkpoint_id], |row| row.get::<_, String>(0))?;
    rows.collect::<std::result::Result<ValueSet, _>>()
        .map_err(Error::from)
}

fn load_project_tags(conn: &Connection, project: &str) -> Result<HashMap<String, ValueSet>> {
    let mut stmt = conn.prepare(
        "SELECT ct.checkpoint_id, ct.tag
         FROM checkpoint_tags ct
         JOIN checkpoints c ON c.id = ct.checkpoint_id
         JOIN notebooks n ON n.id = c.notebook_id
         WHERE n.project = ?1",
    )?;
    let rows = stmt.query_map(params![project], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut tags: HashMap<String, ValueSet> = HashMap::new();
    for row in rows {
        let (checkpoint_id, tag) = row?;
        tags.entry(checkpoint_id).or_default().insert(tag);
    }
    Ok(tags)
}

fn read_content(content: &mut dyn Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    content.read_to_end(&mut buf)?;
    Ok(buf)
}

impl NotebookClient for SqliteStore {
    fn create_notebook(
        &self,
        project: &str,
        source_path: &Path,
        content: &mut dyn Read,
    ) -> Result<NotebookRecord> {
        let name = notebook_name_from(source_path)?;
        let content = read_content(content)?;
        let now = now();

        let notebook = NotebookRecord {
            id: Uuid::new_v4().to_string(),
            project: project.to_string(),
            name,
            owner: self.principal.clone(),
            created_at: now,
        };
        let checkpoint_id = Uuid::new_v4().to_string();

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO notebooks (id, project, name, owner, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                notebook.id,
                notebook.project,
                notebook.name,
                notebook.owner,
                format_datetime(&now),
            ],
        )?;
        tx.execute(
            "INSERT INTO checkpoints (id, notebook_id, name, description, path, content, created_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6)",
            params![
                checkpoint_id,
                notebook.id,
                default_checkpoint_name(&now),
                source_path.to_string_lossy().into_owned(),
                content,
                format_datetime(&now),
            ],
        )?;
        tx.commit()?;

        Ok(notebook)
    }

    fn get_notebook(&self, project: &str, notebook_id: &str) -> Result<NotebookRecord> {
        self.conn()
            .query_row(
                "SELECT id, project, name, owner, created_at
                 FROM notebooks WHERE id = ?1 AND project = ?2",
                params![notebook_id, project],
                notebook_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)
    }

    fn list_notebooks(&self, project: &str) -> Result<Vec<NotebookRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, project, name, owner, created_at
             FROM notebooks WHERE project = ?1 ORDER BY created_at DESC, id",
        )?;

        let rows = stmt.query_map(params![project], notebook_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn create_checkpoint(
        &self,
        notebook_id: &str,
        source_path: &Path,
        content: &mut dyn Read,
        options: &NewCheckpoint,
    ) -> Result<Checkpoint> {
        let content = read_content(content)?;
        let now = now();

        let checkpoint = Checkpoint {
            id: Uuid::new_v4().to_string(),
            notebook_id: notebook_id.to_string(),
            name: options
                .name
                .clone()
                .unwrap_or_else(|| default_checkpoint_name(&now)),
            description: options.description.clone(),
            path: source_path.to_string_lossy().into_owned(),
            tags: options.tags.clone(),
            created_at: now,
        };

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let exists: i32 = tx.query_row(
            "SELECT COUNT(*) FROM notebooks WHERE id = ?1",
            params![notebook_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(Error::NotFound);
        }

        tx.execute(
            "INSERT INTO checkpoints (id, notebook_id, name, description, path, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                checkpoint.id,
                checkpoint.notebook_id,
                checkpoint.name,
                checkpoint.description,
                checkpoint.path,
                content,
                format_datetime(&checkpoint.created_at),
            ],
        )?;
        for tag in &checkpoint.tags {
            tx.execute(
                "INSERT OR IGNORE INTO checkpoint_tags (checkpoint_id, tag) VALUES (?1, ?2)",
                params![checkpoint.id, tag],
            )?;
        }
        tx.commit()?;

        Ok(checkpoint)
    }

    fn get_last_checkpoint(&self, project: &str, notebook_id: &str) -> Result<Checkpoint> {
        let conn = self.conn();
        let mut checkpoint = conn
            .query_row(
                &format!(
                    "SELECT {CHECKPOINT_COLUMNS}
                     FROM checkpoints c
                     JOIN notebooks n ON n.id = c.notebook_id
                     WHERE c.notebook_id = ?1 AND n.project = ?2
                     ORDER BY c.created_at DESC, c.id
                     LIMIT 1"
                ),
                params![notebook_id, project],
                checkpoint_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        checkpoint.tags = load_tags(&conn, &checkpoint.id)?;
        Ok(checkpoint)
    }

    fn fetch_checkpoint_content(&self, checkpoint_id: &str) -> Result<Box<dyn Read + Send>> {
        let content: Vec<u8> = self
            .conn()
            .query_row(
                "SELECT content FROM checkpoints WHERE id = ?1",
                params![checkpoint_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        Ok(Box::new(Cursor::new(content)))
    }

    fn remove_checkpoint(&self, checkpoint_id: &str) -> Result<()> {
        let rows = self.conn().execute(
            "DELETE FROM checkpoints WHERE id = ?1",
            params![checkpoint_id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn list_checkpoints(&self, project: &str, query: &CheckpointQuery) -> Result<Vec<Checkpoint>> {
        let mut sql = format!(
            "SELECT {CHECKPOINT_COLUMNS}
             FROM checkpoints c
             JOIN notebooks n ON n.id = c.notebook_id
             WHERE n.project = ?1"
        );
        let mut args = vec![project.to_string()];

        if let Some(ids) = &query.notebook_id {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders: Vec<String> = (0..ids.len())
                .map(|i| format!("?{}", args.len() + i + 1))
                .collect();
            sql.push_str(&format!(" AND c.notebook_id IN ({})", placeholders.join(", ")));
            args.extend(ids.iter().cloned());
        }
        sql.push_str(" ORDER BY c.created_at DESC, c.id");

        let conn = self.conn();
        let mut tags = load_project_tags(&conn, project)?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), checkpoint_from_row)?;

        let mut checkpoints = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        for checkpoint in &mut checkpoints {
            if let Some(set) = tags.remove(&checkpoint.id) {
                checkpoint.tags = set;
            }
        }
        Ok(checkpoints)
    }

    fn tag_checkpoint(&self, checkpoint_id: &str, tags: &ValueSet) -> Result<Checkpoint> {
        {
            let mut conn = self.conn();
            let tx = conn.transaction()?;

            let exists: i32 = tx.query_row(
                "SELECT COUNT(*) FROM checkpoints WHERE id = ?1",
                params![checkpoint_id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(Error::NotFound);
            }

            for tag in tags {
                tx.execute(
                    "INSERT OR IGNORE INTO checkpoint_tags (checkpoint_id, tag) VALUES (?1, ?2)",
                    params![checkpoint_id, tag],
                )?;
            }
            tx.commit()?;
        }

        self.get_checkpoint(checkpoint_id)?.ok_or(Error::NotFound)
    }
}
