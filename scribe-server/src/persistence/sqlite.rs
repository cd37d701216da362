use super::types::{EntityStore, Result, StoreError};
use crate::core::Entity;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use tracing::{debug, info, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS entities (
    id          TEXT PRIMARY KEY,
    content     TEXT NOT NULL,
    create_date TEXT NOT NULL,
    create_user TEXT NOT NULL
)";

const INSERT: &str =
    "INSERT INTO entities (id, content, create_date, create_user) VALUES (?1, ?2, ?3, ?4)";
const SELECT_BY_ID: &str =
    "SELECT id, content, create_date, create_user FROM entities WHERE id = ?1";
const SELECT_ALL: &str = "SELECT id, content, create_date, create_user FROM entities";
const DELETE: &str = "DELETE FROM entities WHERE id = ?1";

/// Relational entity store on SQLite.
///
/// File-backed stores keep two connections over the WAL journal: a writer
/// for inserts and deletes, and a query-only reader for `get`, `get_all` and
/// `health_check`. Reads therefore never queue behind a batch transaction.
/// In-memory databases are private to one connection, so there the reader
/// is absent and reads go through the writer.
///
/// `close` takes both connections out, after which every call fails with
/// [`StoreError::Closed`].
pub struct SqliteEntityStore {
    writer: Mutex<Option<Connection>>,
    reader: Option<Mutex<Option<Connection>>>,
}

/// Raw row as stored, before the timestamp is parsed
struct EntityRow {
    id: String,
    content: String,
    create_date: String,
    create_user: String,
}

impl EntityRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content: row.get(1)?,
            create_date: row.get(2)?,
            create_user: row.get(3)?,
        })
    }
}

impl TryFrom<EntityRow> for Entity {
    type Error = StoreError;

    fn try_from(row: EntityRow) -> Result<Self> {
        let create_date = DateTime::parse_from_rfc3339(&row.create_date)
            .map_err(|e| {
                StoreError::InvalidData(format!("create_date of {}: {}", row.id, e))
            })?
            .with_timezone(&Utc);

        Ok(Entity::new(row.id, row.content, row.create_user).with_create_date(create_date))
    }
}

impl SqliteEntityStore {
    /// Open or create the database file and its schema
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening SQLite entity store at {:?}", path);
        let writer = Connection::open(path)?;
        writer.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        writer.execute_batch(SCHEMA)?;

        // Opened after the schema exists so its first read sees the table
        let reader = Connection::open(path)?;
        reader.execute_batch("PRAGMA query_only=ON;")?;

        Ok(Self {
            writer: Mutex::new(Some(writer)),
            reader: Some(Mutex::new(Some(reader))),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory SQLite entity store");
        let writer = Connection::open_in_memory()?;
        writer.execute_batch(SCHEMA)?;

        Ok(Self {
            writer: Mutex::new(Some(writer)),
            reader: None,
        })
    }

    fn with_writer<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut guard = self.writer.lock();
        let conn = guard.as_mut().ok_or(StoreError::Closed)?;
        f(conn)
    }

    fn with_reader<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        match &self.reader {
            Some(reader) => {
                let guard = reader.lock();
                let conn = guard.as_ref().ok_or(StoreError::Closed)?;
                f(conn)
            }
            None => self.with_writer(|conn| f(conn)),
        }
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl EntityStore for SqliteEntityStore {
    fn create(&self, entity: &Entity) -> Result<()> {
        debug!("INSERT entity id={}", entity.id());
        self.with_writer(|conn| {
            conn.execute(
                INSERT,
                params![
                    entity.id(),
                    entity.content(),
                    Self::now(),
                    entity.create_user()
                ],
            )?;
            Ok(())
        })
    }

    fn create_batch(&self, entities: &[Entity]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }

        debug!("INSERT batch count={}", entities.len());
        self.with_writer(|conn| {
            let tx = conn.transaction()?;
            {
                let create_date = Self::now();
                let mut stmt = tx.prepare_cached(INSERT)?;
                for entity in entities {
                    stmt.execute(params![
                        entity.id(),
                        entity.content(),
                        create_date,
                        entity.create_user()
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn get(&self, id: &str) -> Result<Option<Entity>> {
        self.with_reader(|conn| {
            conn.query_row(SELECT_BY_ID, params![id], EntityRow::from_row)
                .optional()?
                .map(Entity::try_from)
                .transpose()
        })
    }

    fn get_all(&self) -> Result<Vec<Entity>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare_cached(SELECT_ALL)?;
            let rows = stmt
                .query_map([], EntityRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(Entity::try_from).collect()
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        debug!("DELETE entity id={}", id);
        self.with_writer(|conn| {
            conn.execute(DELETE, params![id])?;
            Ok(())
        })
    }

    fn close(&self) -> Result<()> {
        let reader = self.reader.as_ref().and_then(|reader| reader.lock().take());
        match self.writer.lock().take() {
            Some(writer) => {
                info!("Closing SQLite entity store");
                if let Some(reader) = reader {
                    reader.close().map_err(|(_, e)| StoreError::from(e))?;
                }
                writer.close().map_err(|(_, e)| StoreError::from(e))
            }
            None => {
                warn!("SQLite entity store already closed");
                Ok(())
            }
        }
    }

    fn health_check(&self) -> Result<()> {
        self.with_reader(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}
