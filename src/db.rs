use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{AttendanceType, EventRecord};
use crate::utils;

/// Owns the SQLite connection for the duration of one run; callers construct
/// it explicitly and drop it when the run ends.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open_default() -> rusqlite::Result<Self> {
        let path = utils::database_path();
        utils::ensure_parent(&path);
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS events(
                external_id TEXT PRIMARY KEY,
                source_url TEXT NOT NULL,
                title TEXT NOT NULL,
                start_datetime TEXT,
                end_datetime TEXT,
                all_day INTEGER NOT NULL DEFAULT 0,
                location TEXT,
                location_virtual_url TEXT,
                attendance_type TEXT NOT NULL,
                description TEXT,
                organizer_sponsor TEXT,
                contact_name TEXT,
                contact_phone TEXT,
                contact_email TEXT,
                cost_admission TEXT,
                event_page_url TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                last_scraped_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Insert-or-replace keyed by external id. Every scraped field is
    /// overwritten ("scrape is authoritative"); the collaborator-owned
    /// `tags` column is left alone on update; `last_scraped_at` always
    /// refreshes.
    pub fn upsert_event(&self, event: &EventRecord) -> rusqlite::Result<()> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO events (
                external_id, source_url, title, start_datetime, end_datetime,
                all_day, location, location_virtual_url, attendance_type,
                description, organizer_sponsor, contact_name, contact_phone,
                contact_email, cost_admission, event_page_url, last_scraped_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(external_id) DO UPDATE SET
                source_url = excluded.source_url,
                title = excluded.title,
                start_datetime = excluded.start_datetime,
                end_datetime = excluded.end_datetime,
                all_day = excluded.all_day,
                location = excluded.location,
                location_virtual_url = excluded.location_virtual_url,
                attendance_type = excluded.attendance_type,
                description = excluded.description,
                organizer_sponsor = excluded.organizer_sponsor,
                contact_name = excluded.contact_name,
                contact_phone = excluded.contact_phone,
                contact_email = excluded.contact_email,
                cost_admission = excluded.cost_admission,
                event_page_url = excluded.event_page_url,
                last_scraped_at = excluded.last_scraped_at",
            params![
                event.external_id,
                event.source_url,
                event.title,
                event.start_datetime,
                event.end_datetime,
                event.all_day,
                event.location,
                event.location_virtual_url,
                event.attendance_type.as_str(),
                event.description,
                event.organizer_sponsor,
                event.contact_name,
                event.contact_phone,
                event.contact_email,
                event.cost_admission,
                event.event_page_url,
                now,
            ],
        )?;
        Ok(())
    }

    pub fn get_event(&self, external_id: &str) -> rusqlite::Result<Option<EventRecord>> {
        self.conn
            .query_row(
                "SELECT * FROM events WHERE external_id = ?1",
                params![external_id],
                row_to_record,
            )
            .optional()
    }

    pub fn count_events(&self) -> rusqlite::Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
    }

    /// Tagging-job interface: records the tagger has not touched yet.
    pub fn list_untagged_ids(&self) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT external_id FROM events WHERE tags = '[]' OR tags = ''")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    /// Tagging-job interface: write tags back for one record.
    pub fn set_tags(&self, external_id: &str, tags: &[String]) -> rusqlite::Result<()> {
        let payload = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
        self.conn.execute(
            "UPDATE events SET tags = ?2 WHERE external_id = ?1",
            params![external_id, payload],
        )?;
        Ok(())
    }

    /// Ranking-service interface: future events in start order.
    pub fn upcoming_events(&self, after: NaiveDateTime) -> rusqlite::Result<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM events WHERE start_datetime >= ?1 ORDER BY start_datetime",
        )?;
        let rows = stmt.query_map(params![after], row_to_record)?;
        rows.collect()
    }

    /// Cleanup-collaborator interface: drop records no run has re-seen since
    /// the cutoff. Returns how many rows went away.
    pub fn remove_stale(&self, cutoff: DateTime<Utc>) -> rusqlite::Result<usize> {
        self.conn.execute(
            "DELETE FROM events WHERE last_scraped_at < ?1",
            params![cutoff],
        )
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    // Timestamps come back as text; anything unparseable reads as None
    // instead of failing the row.
    let start: Option<String> = row.get("start_datetime")?;
    let end: Option<String> = row.get("end_datetime")?;
    let attendance: String = row.get("attendance_type")?;
    Ok(EventRecord {
        external_id: row.get("external_id")?,
        source_url: row.get("source_url")?,
        title: row.get("title")?,
        start_datetime: start.as_deref().and_then(parse_naive),
        end_datetime: end.as_deref().and_then(parse_naive),
        all_day: row.get("all_day")?,
        location: row.get("location")?,
        location_virtual_url: row.get("location_virtual_url")?,
        attendance_type: AttendanceType::from_str(&attendance)
            .unwrap_or(AttendanceType::InPerson),
        description: row.get("description")?,
        organizer_sponsor: row.get("organizer_sponsor")?,
        contact_name: row.get("contact_name")?,
        contact_phone: row.get("contact_phone")?,
        contact_email: row.get("contact_email")?,
        cost_admission: row.get("cost_admission")?,
        event_page_url: row.get("event_page_url")?,
        last_scraped_at: row.get("last_scraped_at")?,
    })
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}
