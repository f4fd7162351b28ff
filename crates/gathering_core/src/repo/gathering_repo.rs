//! Gathering repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist gathering scalar fields and the gathering side of the association.
//!
//! # Invariants
//! - `update` and `update_attendees` replace the full attendee set in one
//!   transaction; `update_details` never touches link rows.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::SharedConnection;
use crate::model::attendee::AttendeeId;
use crate::model::gathering::{Gathering, GatheringId};
use crate::repo::{assign_id, date_to_db, parse_date, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::sync::Arc;

const GATHERING_SELECT_SQL: &str = "SELECT id, name, date, location FROM gatherings";

/// Storage collaborator for gatherings.
pub trait GatheringRepository: Send + Sync {
    /// Stores a new gathering and returns it with its assigned identifier.
    fn add(&self, gathering: &Gathering) -> RepoResult<Gathering>;
    fn update(&self, gathering: &Gathering) -> RepoResult<()>;
    /// Writes name, date and location only; the stored attendee set is kept.
    fn update_details(&self, gathering: &Gathering) -> RepoResult<()>;
    /// Writes the attendee set only; the stored scalar fields are kept.
    fn update_attendees(&self, gathering: &Gathering) -> RepoResult<()>;
    fn delete(&self, gathering: &Gathering) -> RepoResult<()>;
    fn get_by_id(&self, id: GatheringId) -> RepoResult<Option<Gathering>>;
    fn list_all(&self) -> RepoResult<Vec<Gathering>>;
}

impl<T: GatheringRepository + ?Sized> GatheringRepository for Arc<T> {
    fn add(&self, gathering: &Gathering) -> RepoResult<Gathering> {
        (**self).add(gathering)
    }

    fn update(&self, gathering: &Gathering) -> RepoResult<()> {
        (**self).update(gathering)
    }

    fn update_details(&self, gathering: &Gathering) -> RepoResult<()> {
        (**self).update_details(gathering)
    }

    fn update_attendees(&self, gathering: &Gathering) -> RepoResult<()> {
        (**self).update_attendees(gathering)
    }

    fn delete(&self, gathering: &Gathering) -> RepoResult<()> {
        (**self).delete(gathering)
    }

    fn get_by_id(&self, id: GatheringId) -> RepoResult<Option<Gathering>> {
        (**self).get_by_id(id)
    }

    fn list_all(&self) -> RepoResult<Vec<Gathering>> {
        (**self).list_all()
    }
}

/// SQLite-backed gathering repository.
#[derive(Clone)]
pub struct SqliteGatheringRepository {
    conn: SharedConnection,
}

impl SqliteGatheringRepository {
    /// Constructs a repository over a migrated shared connection.
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl GatheringRepository for SqliteGatheringRepository {
    fn add(&self, gathering: &Gathering) -> RepoResult<Gathering> {
        let mut stored = gathering.clone();
        stored.id = assign_id(gathering.id);

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO gatherings (id, name, date, location) VALUES (?1, ?2, ?3, ?4);",
            params![
                stored.id.to_string(),
                stored.name.as_str(),
                date_to_db(stored.date),
                stored.location.as_str(),
            ],
        )?;
        replace_attendee_links(&tx, stored.id, stored.attendee_ids())?;
        tx.commit()?;

        Ok(stored)
    }

    fn update(&self, gathering: &Gathering) -> RepoResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        write_details(&tx, gathering)?;
        replace_attendee_links(&tx, gathering.id, gathering.attendee_ids())?;
        tx.commit()?;

        Ok(())
    }

    fn update_details(&self, gathering: &Gathering) -> RepoResult<()> {
        let conn = self.conn.lock();
        write_details(&conn, gathering)
    }

    fn update_attendees(&self, gathering: &Gathering) -> RepoResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let stored: i64 = tx.query_row(
            "SELECT COUNT(*) FROM gatherings WHERE id = ?1;",
            [gathering.id.to_string()],
            |row| row.get(0),
        )?;
        if stored == 0 {
            return Err(RepoError::NotFound(gathering.id));
        }
        replace_attendee_links(&tx, gathering.id, gathering.attendee_ids())?;
        tx.commit()?;

        Ok(())
    }

    fn delete(&self, gathering: &Gathering) -> RepoResult<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "DELETE FROM gatherings WHERE id = ?1;",
            [gathering.id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(gathering.id));
        }

        Ok(())
    }

    fn get_by_id(&self, id: GatheringId) -> RepoResult<Option<Gathering>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{GATHERING_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_gathering_row(&conn, row)?));
        }

        Ok(None)
    }

    fn list_all(&self) -> RepoResult<Vec<Gathering>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{GATHERING_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut gatherings = Vec::new();
        while let Some(row) = rows.next()? {
            gatherings.push(parse_gathering_row(&conn, row)?);
        }

        Ok(gatherings)
    }
}

fn write_details(conn: &Connection, gathering: &Gathering) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE gatherings SET name = ?2, date = ?3, location = ?4 WHERE id = ?1;",
        params![
            gathering.id.to_string(),
            gathering.name.as_str(),
            date_to_db(gathering.date),
            gathering.location.as_str(),
        ],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(gathering.id));
    }
    Ok(())
}

fn parse_gathering_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Gathering> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "gatherings.id")?;
    let date = parse_date(row.get("date")?, "gatherings.date")?;
    let attendee_ids = load_attendee_ids(conn, &id_text)?;

    Ok(
        Gathering::with_id(id, row.get::<_, String>("name")?, date, row.get::<_, String>("location")?)
            .with_attendee_ids(attendee_ids),
    )
}

fn load_attendee_ids(conn: &Connection, gathering_id: &str) -> RepoResult<BTreeSet<AttendeeId>> {
    let mut stmt = conn.prepare(
        "SELECT attendee_id FROM gathering_attendees WHERE gathering_id = ?1;",
    )?;
    let mut rows = stmt.query([gathering_id])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.insert(parse_uuid(&value, "gathering_attendees.attendee_id")?);
    }
    Ok(ids)
}

fn replace_attendee_links(
    conn: &Connection,
    gathering_id: GatheringId,
    attendee_ids: &BTreeSet<AttendeeId>,
) -> RepoResult<()> {
    let gathering_id = gathering_id.to_string();
    conn.execute(
        "DELETE FROM gathering_attendees WHERE gathering_id = ?1;",
        [gathering_id.as_str()],
    )?;
    for attendee_id in attendee_ids {
        conn.execute(
            "INSERT INTO gathering_attendees (gathering_id, attendee_id) VALUES (?1, ?2);",
            params![gathering_id.as_str(), attendee_id.to_string()],
        )?;
    }
    Ok(())
}
