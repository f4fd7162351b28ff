//! Attendee repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist attendee fields and the attendee side of the association.
//! - Resolve attendees by their unique e-mail address.
//!
//! # Invariants
//! - `email` is unique; a second insert reports `RepoError::DuplicateEmail`.
//! - Writes replace the attendee's full gathering set in one transaction.

use crate::db::SharedConnection;
use crate::model::attendee::{Attendee, AttendeeId};
use crate::model::gathering::GatheringId;
use crate::repo::{assign_id, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::collections::BTreeSet;
use std::sync::Arc;

const ATTENDEE_SELECT_SQL: &str = "SELECT id, name, email FROM attendees";

/// Storage collaborator for attendees.
pub trait AttendeeRepository: Send + Sync {
    /// Stores a new attendee and returns it with its assigned identifier.
    fn add(&self, attendee: &Attendee) -> RepoResult<Attendee>;
    fn update(&self, attendee: &Attendee) -> RepoResult<()>;
    fn delete(&self, attendee: &Attendee) -> RepoResult<()>;
    fn get_by_id(&self, id: AttendeeId) -> RepoResult<Option<Attendee>>;
    fn get_by_email(&self, email: &str) -> RepoResult<Option<Attendee>>;
    fn list_all(&self) -> RepoResult<Vec<Attendee>>;
}

impl<T: AttendeeRepository + ?Sized> AttendeeRepository for Arc<T> {
    fn add(&self, attendee: &Attendee) -> RepoResult<Attendee> {
        (**self).add(attendee)
    }

    fn update(&self, attendee: &Attendee) -> RepoResult<()> {
        (**self).update(attendee)
    }

    fn delete(&self, attendee: &Attendee) -> RepoResult<()> {
        (**self).delete(attendee)
    }

    fn get_by_id(&self, id: AttendeeId) -> RepoResult<Option<Attendee>> {
        (**self).get_by_id(id)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Option<Attendee>> {
        (**self).get_by_email(email)
    }

    fn list_all(&self) -> RepoResult<Vec<Attendee>> {
        (**self).list_all()
    }
}

/// SQLite-backed attendee repository.
#[derive(Clone)]
pub struct SqliteAttendeeRepository {
    conn: SharedConnection,
}

impl SqliteAttendeeRepository {
    /// Constructs a repository over a migrated shared connection.
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl AttendeeRepository for SqliteAttendeeRepository {
    fn add(&self, attendee: &Attendee) -> RepoResult<Attendee> {
        let mut stored = attendee.clone();
        stored.id = assign_id(attendee.id);

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO attendees (id, name, email) VALUES (?1, ?2, ?3);",
            params![
                stored.id.to_string(),
                stored.name.as_str(),
                stored.email.as_str()
            ],
        )
        .map_err(|err| map_email_conflict(err, &stored.email))?;
        replace_gathering_links(&tx, stored.id, stored.gathering_ids())?;
        tx.commit()?;

        Ok(stored)
    }

    fn update(&self, attendee: &Attendee) -> RepoResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let changed = tx
            .execute(
                "UPDATE attendees SET name = ?2, email = ?3 WHERE id = ?1;",
                params![
                    attendee.id.to_string(),
                    attendee.name.as_str(),
                    attendee.email.as_str()
                ],
            )
            .map_err(|err| map_email_conflict(err, &attendee.email))?;
        if changed == 0 {
            return Err(RepoError::NotFound(attendee.id));
        }
        replace_gathering_links(&tx, attendee.id, attendee.gathering_ids())?;
        tx.commit()?;

        Ok(())
    }

    fn delete(&self, attendee: &Attendee) -> RepoResult<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "DELETE FROM attendees WHERE id = ?1;",
            [attendee.id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(attendee.id));
        }

        Ok(())
    }

    fn get_by_id(&self, id: AttendeeId) -> RepoResult<Option<Attendee>> {
        self.query_one("id = ?1", id.to_string().as_str())
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Option<Attendee>> {
        self.query_one("email = ?1", email)
    }

    fn list_all(&self) -> RepoResult<Vec<Attendee>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{ATTENDEE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut attendees = Vec::new();
        while let Some(row) = rows.next()? {
            attendees.push(parse_attendee_row(&conn, row)?);
        }

        Ok(attendees)
    }
}

impl SqliteAttendeeRepository {
    fn query_one(&self, predicate: &str, value: &str) -> RepoResult<Option<Attendee>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{ATTENDEE_SELECT_SQL} WHERE {predicate};"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attendee_row(&conn, row)?));
        }

        Ok(None)
    }
}

fn map_email_conflict(err: rusqlite::Error, email: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation && message.contains("attendees.email") {
            return RepoError::DuplicateEmail(email.to_string());
        }
    }
    err.into()
}

fn parse_attendee_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Attendee> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "attendees.id")?;
    let gathering_ids = load_gathering_ids(conn, &id_text)?;

    Ok(Attendee::with_id(
        id,
        row.get::<_, String>("name")?,
        row.get::<_, String>("email")?,
    )
    .with_gathering_ids(gathering_ids))
}

fn load_gathering_ids(conn: &Connection, attendee_id: &str) -> RepoResult<BTreeSet<GatheringId>> {
    let mut stmt = conn.prepare(
        "SELECT gathering_id FROM gathering_attendees WHERE attendee_id = ?1;",
    )?;
    let mut rows = stmt.query([attendee_id])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.insert(parse_uuid(&value, "gathering_attendees.gathering_id")?);
    }
    Ok(ids)
}

fn replace_gathering_links(
    conn: &Connection,
    attendee_id: AttendeeId,
    gathering_ids: &BTreeSet<GatheringId>,
) -> RepoResult<()> {
    let attendee_id = attendee_id.to_string();
    conn.execute(
        "DELETE FROM gathering_attendees WHERE attendee_id = ?1;",
        [attendee_id.as_str()],
    )?;
    for gathering_id in gathering_ids {
        conn.execute(
            "INSERT INTO gathering_attendees (gathering_id, attendee_id) VALUES (?1, ?2);",
            params![gathering_id.to_string(), attendee_id.as_str()],
        )?;
    }
    Ok(())
}
