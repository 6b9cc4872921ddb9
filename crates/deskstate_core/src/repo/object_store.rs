//! Generic object store over SQLite.
//!
//! # Responsibility
//! - Provide get/must-get/get-singleton/create/update for every
//!   [`StoredObject`] kind.
//! - Serialize concurrent writers and bound every call by its deadline.
//!
//! # Invariants
//! - All access goes through one connection guarded by a mutex; lock waits
//!   never outlive the caller's deadline.
//! - `update` is compare-and-swap on `version`; a stale write fails with
//!   `VersionConflict` and never overwrites newer state.
//! - `modify*` performs read and write inside one critical section.
//! - `create_attached` inserts a child and updates its owner in one
//!   transaction.
//! - Journal records are appended after the write committed.

use super::context::RequestContext;
use super::journal::{UpdateRecord, UpdateType};
use crate::db::{open_db_in_memory, DbError};
use crate::model::{ObjectKind, StoredObject};
use log::{debug, warn};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Number of SQLite VM steps between deadline checks.
const PROGRESS_HANDLER_OPS: i32 = 1000;

const SELECT_BY_ID_SQL: &str = "SELECT version, data FROM objects WHERE otype = ?1 AND oid = ?2;";
const SELECT_FIRST_SQL: &str =
    "SELECT version, data FROM objects WHERE otype = ?1 ORDER BY rowid ASC LIMIT 1;";
const SELECT_ALL_SQL: &str =
    "SELECT version, data FROM objects WHERE otype = ?1 ORDER BY rowid ASC;";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    NotFound {
        kind: ObjectKind,
        oid: String,
    },
    AlreadyExists {
        kind: ObjectKind,
        oid: String,
    },
    /// No instance of a singleton kind has been created yet.
    SingletonMissing(ObjectKind),
    /// `get_singleton` was called for a non-singleton kind.
    NotSingleton(ObjectKind),
    VersionConflict {
        kind: ObjectKind,
        oid: String,
        expected: i64,
        actual: i64,
    },
    DeadlineExceeded,
    InvalidData(String),
    Db(DbError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::SingletonMissing(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, oid } => write!(f, "{kind} not found: {oid}"),
            Self::AlreadyExists { kind, oid } => write!(f, "{kind} already exists: {oid}"),
            Self::SingletonMissing(kind) => write!(f, "singleton {kind} does not exist"),
            Self::NotSingleton(kind) => write!(f, "{kind} is not a singleton kind"),
            Self::VersionConflict {
                kind,
                oid,
                expected,
                actual,
            } => write!(
                f,
                "{kind} {oid} was modified concurrently: expected version {expected}, found {actual}"
            ),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
            Self::InvalidData(message) => write!(f, "invalid persisted object data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == ErrorCode::OperationInterrupted =>
            {
                Self::DeadlineExceeded
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Shared, process-wide object store.
pub struct ObjectStore {
    conn: Mutex<Connection>,
}

impl ObjectStore {
    /// Wraps an already migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Loads one object. Absence is `Ok(None)`, not an error.
    pub fn get<T: StoredObject>(&self, ctx: &RequestContext, oid: &str) -> StoreResult<Option<T>> {
        let conn = self.lock(ctx)?;
        read_object(&conn, oid)
    }

    /// Loads one object, failing with `NotFound` when absent.
    pub fn must_get<T: StoredObject>(&self, ctx: &RequestContext, oid: &str) -> StoreResult<T> {
        self.get(ctx, oid)?.ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            oid: oid.to_string(),
        })
    }

    /// Loads the unique instance of a singleton kind.
    pub fn get_singleton<T: StoredObject>(&self, ctx: &RequestContext) -> StoreResult<T> {
        ensure_singleton::<T>()?;
        let conn = self.lock(ctx)?;
        read_singleton::<T>(&conn)?.ok_or(StoreError::SingletonMissing(T::KIND))
    }

    /// Lists every object of one kind in creation order.
    pub fn get_all<T: StoredObject>(&self, ctx: &RequestContext) -> StoreResult<Vec<T>> {
        let conn = self.lock(ctx)?;
        let mut stmt = conn.prepare(SELECT_ALL_SQL)?;
        let mut rows = stmt.query([T::KIND.as_str()])?;
        let mut objects = Vec::new();
        while let Some(row) = rows.next()? {
            objects.push(decode(row.get(0)?, &row.get::<_, String>(1)?)?);
        }
        Ok(objects)
    }

    /// Persists a new object and returns it with its initial version.
    ///
    /// # Errors
    /// - `AlreadyExists` when the id is taken, or when a singleton kind
    ///   already has an instance.
    pub fn create<T: StoredObject>(&self, ctx: &mut RequestContext, mut obj: T) -> StoreResult<T> {
        let conn = self.lock(ctx)?;
        insert_new(&conn, &mut obj)?;
        drop(conn);

        ctx.record(UpdateRecord::for_object(UpdateType::Created, &obj));
        Ok(obj)
    }

    /// Creates `child` and edits its `parent_oid` owner in one transaction.
    ///
    /// Either both writes commit or neither does. On success the journal
    /// gets the child creation followed by the parent update.
    ///
    /// # Errors
    /// - `NotFound` when the parent does not exist; nothing is written.
    /// - Any insert or parent write failure rolls back the child insert.
    pub fn create_attached<C, P, F>(
        &self,
        ctx: &mut RequestContext,
        mut child: C,
        parent_oid: &str,
        attach: F,
    ) -> StoreResult<(C, P)>
    where
        C: StoredObject,
        P: StoredObject,
        F: FnOnce(&mut P, &C),
    {
        let mut conn = self.lock(ctx)?;
        let tx = conn.transaction()?;
        let mut parent =
            read_object::<P>(&tx, parent_oid)?.ok_or_else(|| StoreError::NotFound {
                kind: P::KIND,
                oid: parent_oid.to_string(),
            })?;

        insert_new(&tx, &mut child)?;
        attach(&mut parent, &child);
        write_existing(&tx, &mut parent)?;
        tx.commit()?;
        drop(conn);

        ctx.record(UpdateRecord::for_object(UpdateType::Created, &child));
        ctx.record(UpdateRecord::for_object(UpdateType::Updated, &parent));
        Ok((child, parent))
    }

    /// Replaces an existing object. On success `obj.version()` is bumped.
    ///
    /// # Errors
    /// - `NotFound` when the object no longer exists.
    /// - `VersionConflict` when `obj` is stale.
    pub fn update<T: StoredObject>(&self, ctx: &mut RequestContext, obj: &mut T) -> StoreResult<()> {
        let conn = self.lock(ctx)?;
        write_existing(&conn, obj)?;
        drop(conn);

        ctx.record(UpdateRecord::for_object(UpdateType::Updated, obj));
        Ok(())
    }

    /// Atomically loads, edits and writes back one object.
    ///
    /// `edit` returns whether it changed anything; when it returns `false`
    /// nothing is written and nothing is journaled.
    pub fn modify<T, F>(&self, ctx: &mut RequestContext, oid: &str, edit: F) -> StoreResult<T>
    where
        T: StoredObject,
        F: FnOnce(&mut T) -> bool,
    {
        self.modify_with(
            ctx,
            |conn| {
                read_object(conn, oid)?.ok_or_else(|| StoreError::NotFound {
                    kind: T::KIND,
                    oid: oid.to_string(),
                })
            },
            edit,
        )
    }

    /// [`ObjectStore::modify`] for the instance of a singleton kind.
    pub fn modify_singleton<T, F>(&self, ctx: &mut RequestContext, edit: F) -> StoreResult<T>
    where
        T: StoredObject,
        F: FnOnce(&mut T) -> bool,
    {
        ensure_singleton::<T>()?;
        self.modify_with(
            ctx,
            |conn| read_singleton(conn)?.ok_or(StoreError::SingletonMissing(T::KIND)),
            edit,
        )
    }

    fn modify_with<T, L, F>(&self, ctx: &mut RequestContext, load: L, edit: F) -> StoreResult<T>
    where
        T: StoredObject,
        L: FnOnce(&Connection) -> StoreResult<T>,
        F: FnOnce(&mut T) -> bool,
    {
        let conn = self.lock(ctx)?;
        let mut obj = load(&*conn)?;
        if !edit(&mut obj) {
            return Ok(obj);
        }
        write_existing(&conn, &mut obj)?;
        drop(conn);

        ctx.record(UpdateRecord::for_object(UpdateType::Updated, &obj));
        Ok(obj)
    }

    fn lock(&self, ctx: &RequestContext) -> StoreResult<MutexGuard<'_, Connection>> {
        ctx.check_deadline()?;
        let conn = self
            .conn
            .try_lock_for(ctx.remaining())
            .ok_or(StoreError::DeadlineExceeded)?;

        let deadline = ctx.deadline();
        conn.progress_handler(
            PROGRESS_HANDLER_OPS,
            Some(move || Instant::now() >= deadline),
        );
        Ok(conn)
    }
}

fn ensure_singleton<T: StoredObject>() -> StoreResult<()> {
    if !T::SINGLETON {
        return Err(StoreError::NotSingleton(T::KIND));
    }
    Ok(())
}

fn object_exists(conn: &Connection, kind: ObjectKind, oid: &str) -> StoreResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM objects WHERE otype = ?1 AND oid = ?2;",
            params![kind.as_str(), oid],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn insert_new<T: StoredObject>(conn: &Connection, obj: &mut T) -> StoreResult<()> {
    if T::SINGLETON {
        if let Some(existing) = read_singleton::<T>(conn)? {
            return Err(StoreError::AlreadyExists {
                kind: T::KIND,
                oid: existing.oid().to_string(),
            });
        }
    }

    if object_exists(conn, T::KIND, obj.oid())? {
        return Err(StoreError::AlreadyExists {
            kind: T::KIND,
            oid: obj.oid().to_string(),
        });
    }

    obj.set_version(1);
    let inserted = encode(obj).and_then(|data| {
        conn.execute(
            "INSERT INTO objects (otype, oid, version, data) VALUES (?1, ?2, ?3, ?4);",
            params![T::KIND.as_str(), obj.oid(), obj.version(), data],
        )
        .map_err(StoreError::from)
    });
    if let Err(err) = inserted {
        obj.set_version(0);
        return Err(err);
    }

    debug!(
        "event=store_create module=store status=ok otype={} oid={}",
        T::KIND,
        obj.oid()
    );
    Ok(())
}

fn read_object<T: StoredObject>(conn: &Connection, oid: &str) -> StoreResult<Option<T>> {
    let row = conn
        .query_row(SELECT_BY_ID_SQL, params![T::KIND.as_str(), oid], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .optional()?;
    row.map(|(version, data)| decode(version, &data))
        .transpose()
}

fn read_singleton<T: StoredObject>(conn: &Connection) -> StoreResult<Option<T>> {
    let row = conn
        .query_row(SELECT_FIRST_SQL, [T::KIND.as_str()], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .optional()?;
    row.map(|(version, data)| decode(version, &data))
        .transpose()
}

fn write_existing<T: StoredObject>(conn: &Connection, obj: &mut T) -> StoreResult<()> {
    let expected = obj.version();
    obj.set_version(expected + 1);
    let data = match encode(obj) {
        Ok(data) => data,
        Err(err) => {
            obj.set_version(expected);
            return Err(err);
        }
    };

    let changed = conn.execute(
        "UPDATE objects
         SET
            version = ?1,
            data = ?2,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE otype = ?3 AND oid = ?4 AND version = ?5;",
        params![expected + 1, data, T::KIND.as_str(), obj.oid(), expected],
    );
    let changed = match changed {
        Ok(changed) => changed,
        Err(err) => {
            obj.set_version(expected);
            return Err(err.into());
        }
    };
    if changed == 1 {
        debug!(
            "event=store_update module=store status=ok otype={} oid={} version={}",
            T::KIND,
            obj.oid(),
            expected + 1
        );
        return Ok(());
    }

    obj.set_version(expected);
    let actual = conn
        .query_row(
            "SELECT version FROM objects WHERE otype = ?1 AND oid = ?2;",
            params![T::KIND.as_str(), obj.oid()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    match actual {
        None => Err(StoreError::NotFound {
            kind: T::KIND,
            oid: obj.oid().to_string(),
        }),
        Some(actual) => {
            warn!(
                "event=store_update module=store status=error error_code=version_conflict otype={} oid={} expected={} actual={}",
                T::KIND,
                obj.oid(),
                expected,
                actual
            );
            Err(StoreError::VersionConflict {
                kind: T::KIND,
                oid: obj.oid().to_string(),
                expected,
                actual,
            })
        }
    }
}

fn encode<T: StoredObject>(obj: &T) -> StoreResult<String> {
    serde_json::to_string(obj).map_err(|err| {
        StoreError::InvalidData(format!("cannot encode {} {}: {err}", T::KIND, obj.oid()))
    })
}

fn decode<T: StoredObject>(version: i64, data: &str) -> StoreResult<T> {
    let mut obj: T = serde_json::from_str(data)
        .map_err(|err| StoreError::InvalidData(format!("cannot decode {}: {err}", T::KIND)))?;
    obj.set_version(version);
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::StoreError;
    use rusqlite::ffi;

    #[test]
    fn interrupted_statement_maps_to_deadline_exceeded() {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_INTERRUPT), None);
        assert!(matches!(
            StoreError::from(err),
            StoreError::DeadlineExceeded
        ));
    }

    #[test]
    fn other_sqlite_failures_stay_db_errors() {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_CONSTRAINT), None);
        assert!(matches!(StoreError::from(err), StoreError::Db(_)));
    }
}
