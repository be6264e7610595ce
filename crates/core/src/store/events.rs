//! Meetup event records.
//!
//! Events are written by the upstream synchronization process and read by
//! display code. Listings are ordered by scheduled time, earliest first.

use std::fmt;

use super::connection::MeetupDb;
use super::timestamp;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row};

/// Maximum length of an event id.
pub const MAX_ID_LEN: usize = 100;

/// Maximum length of `name`, `status` and `visibility`.
pub const MAX_LABEL_LEN: usize = 255;

const COLUMNS: &str = "id, name, description, event_url, time, created, updated,
    rsvps, maybe_rsvps, waitlist_count, status, visibility";

/// A meetup occurrence.
///
/// The id is assigned by the upstream event platform, not generated here.
/// `created` and `updated` are supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub event_url: String,

    pub time: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,

    #[serde(default)]
    pub rsvps: u32,
    #[serde(default)]
    pub maybe_rsvps: u32,
    #[serde(default)]
    pub waitlist_count: u32,

    pub status: String,
    pub visibility: String,
}

impl Event {
    /// Check required fields, length limits and timestamp range.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        required("id", &self.id, Some(MAX_ID_LEN))?;
        required("name", &self.name, Some(MAX_LABEL_LEN))?;
        required("event_url", &self.event_url, None)?;
        required("status", &self.status, Some(MAX_LABEL_LEN))?;
        required("visibility", &self.visibility, Some(MAX_LABEL_LEN))?;
        storable("time", self.time)?;
        storable("created", self.created)?;
        storable("updated", self.updated)?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Event {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            event_url: row.get(3)?,
            time: timestamp::column(row, 4)?,
            created: timestamp::column(row, 5)?,
            updated: timestamp::column(row, 6)?,
            rsvps: row.get(7)?,
            maybe_rsvps: row.get(8)?,
            waitlist_count: row.get(9)?,
            status: row.get(10)?,
            visibility: row.get(11)?,
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn required(field: &str, value: &str, max_len: Option<usize>) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{field} must not be empty")));
    }
    if let Some(max) = max_len {
        if value.chars().count() > max {
            return Err(Error::InvalidInput(format!("{field} must not exceed {max} characters")));
        }
    }
    Ok(())
}

fn storable(field: &str, ts: DateTime<Utc>) -> Result<(), Error> {
    if !timestamp::is_storable(ts) {
        return Err(Error::InvalidInput(format!("{field} must fall within years 0000 to 9999")));
    }
    Ok(())
}

/// Restartable query over events scheduled after the moment it is fetched.
///
/// Holds no rows itself: every [`EventQuery::fetch`] reads the store again
/// and re-evaluates "now".
#[derive(Clone, Debug)]
pub struct EventQuery {
    db: MeetupDb,
    limit: Option<usize>,
}

impl EventQuery {
    /// Cap the number of rows returned by [`EventQuery::fetch`].
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Events with `time` strictly after now, earliest first.
    pub async fn fetch(&self) -> Result<Vec<Event>, Error> {
        let now = timestamp::encode(Utc::now());
        let limit = self.limit.map_or(-1, |l| l as i64);
        self.db
            .conn
            .call(move |conn| -> Result<Vec<Event>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM meetups WHERE time > ?1 ORDER BY time ASC, id ASC LIMIT ?2"
                ))?;
                let events = stmt
                    .query_map(params![now, limit], Event::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(events)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of events with `time` strictly after now.
    pub async fn count(&self) -> Result<u64, Error> {
        let now = timestamp::encode(Utc::now());
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM meetups WHERE time > ?1", params![now], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

impl MeetupDb {
    /// Insert a new event.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if a required field is empty or too long
    /// - `Error::UniqueViolation` if an event with the same id exists
    pub async fn insert_event(&self, event: &Event) -> Result<(), Error> {
        if let Err(e) = event.validate() {
            tracing::warn!(id = %event.id, error = %e, "rejected event");
            return Err(e);
        }

        let event = event.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    &format!(
                        "INSERT INTO meetups ({COLUMNS})
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                    ),
                    params![
                        &event.id,
                        &event.name,
                        &event.description,
                        &event.event_url,
                        timestamp::encode(event.time),
                        timestamp::encode(event.created),
                        timestamp::encode(event.updated),
                        event.rsvps,
                        event.maybe_rsvps,
                        event.waitlist_count,
                        &event.status,
                        &event.visibility,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update an event.
    ///
    /// Uses UPSERT semantics: inserts if the id doesn't exist,
    /// updates all other fields if it does. Sponsor links are kept.
    pub async fn upsert_event(&self, event: &Event) -> Result<(), Error> {
        if let Err(e) = event.validate() {
            tracing::warn!(id = %event.id, error = %e, "rejected event");
            return Err(e);
        }

        let event = event.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    &format!(
                        "INSERT INTO meetups ({COLUMNS})
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                        ON CONFLICT(id) DO UPDATE SET
                            name = excluded.name,
                            description = excluded.description,
                            event_url = excluded.event_url,
                            time = excluded.time,
                            created = excluded.created,
                            updated = excluded.updated,
                            rsvps = excluded.rsvps,
                            maybe_rsvps = excluded.maybe_rsvps,
                            waitlist_count = excluded.waitlist_count,
                            status = excluded.status,
                            visibility = excluded.visibility"
                    ),
                    params![
                        &event.id,
                        &event.name,
                        &event.description,
                        &event.event_url,
                        timestamp::encode(event.time),
                        timestamp::encode(event.created),
                        timestamp::encode(event.updated),
                        event.rsvps,
                        event.maybe_rsvps,
                        event.waitlist_count,
                        &event.status,
                        &event.visibility,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an event by id.
    ///
    /// Returns None if the id doesn't exist.
    pub async fn get_event(&self, id: &str) -> Result<Option<Event>, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Event>, Error> {
                let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM meetups WHERE id = ?1"))?;

                match stmt.query_row(params![id], Event::from_row) {
                    Ok(event) => Ok(Some(event)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// All events, earliest first.
    pub async fn list_events(&self) -> Result<Vec<Event>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Event>, Error> {
                let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM meetups ORDER BY time ASC, id ASC"))?;
                let events = stmt
                    .query_map([], Event::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(events)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an event and its sponsor links.
    ///
    /// Returns whether a row was removed.
    pub async fn delete_event(&self, id: &str) -> Result<bool, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM meetups WHERE id = ?1", params![id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Query for events scheduled after now, earliest first.
    ///
    /// The returned query can be fetched repeatedly; each fetch reflects
    /// the current contents of the store.
    pub fn future_events(&self) -> EventQuery {
        EventQuery { db: self.clone(), limit: None }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub(crate) fn make_test_event(id: &str, time: DateTime<Utc>) -> Event {
        let now = timestamp::truncate(Utc::now());
        Event {
            id: id.to_string(),
            name: format!("Python Meetup {id}"),
            description: "Talks and pizza".to_string(),
            event_url: format!("https://www.meetup.com/pythonireland/events/{id}/"),
            time: timestamp::truncate(time),
            created: now,
            updated: now,
            rsvps: 0,
            maybe_rsvps: 0,
            waitlist_count: 0,
            status: "upcoming".to_string(),
            visibility: "public".to_string(),
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let mut event = make_test_event("1001", Utc::now() + Duration::days(7));
        event.rsvps = 42;
        event.maybe_rsvps = 3;
        event.waitlist_count = 5;

        db.insert_event(&event).await.unwrap();

        let retrieved = db.get_event("1001").await.unwrap().unwrap();
        assert_eq!(retrieved, event);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        assert!(db.get_event("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let event = make_test_event("dup", Utc::now());
        db.insert_event(&event).await.unwrap();

        let result = db.insert_event(&event).await;
        assert!(matches!(result, Err(Error::UniqueViolation(_))));
    }

    #[tokio::test]
    async fn test_required_fields_validated() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let base = make_test_event("2001", Utc::now());

        let cases = [
            Event { name: String::new(), ..base.clone() },
            Event { event_url: String::new(), ..base.clone() },
            Event { status: "  ".to_string(), ..base.clone() },
            Event { visibility: String::new(), ..base.clone() },
            Event { id: "x".repeat(MAX_ID_LEN + 1), ..base.clone() },
            Event { name: "n".repeat(MAX_LABEL_LEN + 1), ..base.clone() },
        ];
        for event in cases {
            let result = db.insert_event(&event).await;
            assert!(matches!(result, Err(Error::InvalidInput(_))), "accepted {event:?}");
        }
        assert!(db.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_timestamps_rejected() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let base = make_test_event("far", Utc::now() + Duration::days(1));

        let cases = [
            Event { time: far, ..base.clone() },
            Event { created: far, ..base.clone() },
            Event { updated: far, ..base.clone() },
        ];
        for event in cases {
            assert!(matches!(db.insert_event(&event).await, Err(Error::InvalidInput(_))));
            assert!(matches!(db.upsert_event(&event).await, Err(Error::InvalidInput(_))));
        }

        db.insert_event(&base).await.unwrap();
        assert_eq!(ids(&db.list_events().await.unwrap()), vec!["far"]);
        assert_eq!(db.get_event("far").await.unwrap(), Some(base));
        assert_eq!(db.future_events().count().await.unwrap(), 1);
    }

    #[test]
    fn test_serde_roundtrip() {
        let event = make_test_event("6001", Utc::now() + Duration::days(2));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_url\""));
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_serde_counters_default_to_zero() {
        let json = r#"{
            "id": "7001",
            "name": "Sprint",
            "event_url": "https://www.meetup.com/pythonireland/events/7001/",
            "time": "2030-01-01T18:00:00Z",
            "created": "2029-12-01T09:00:00Z",
            "updated": "2029-12-01T09:00:00Z",
            "status": "upcoming",
            "visibility": "public"
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!((event.rsvps, event.maybe_rsvps, event.waitlist_count), (0, 0, 0));
        assert_eq!(event.description, "");
    }

    #[tokio::test]
    async fn test_store_rejects_empty_name() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let result = db
            .conn
            .call(|conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO meetups (id, name, event_url, time, created, updated, status, visibility)
                    VALUES ('raw', '', 'https://example.com', 'a', 'a', 'a', 'upcoming', 'public')",
                    [],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from);
        assert!(matches!(result, Err(Error::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_future_events_excludes_past_and_orders_by_time() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let now = Utc::now();
        db.insert_event(&make_test_event("past", now - Duration::days(1))).await.unwrap();
        db.insert_event(&make_test_event("later", now + Duration::days(30))).await.unwrap();
        db.insert_event(&make_test_event("soon", now + Duration::minutes(1))).await.unwrap();
        db.insert_event(&make_test_event("middle", now + Duration::days(7))).await.unwrap();

        let future = db.future_events().fetch().await.unwrap();
        assert_eq!(ids(&future), vec!["soon", "middle", "later"]);
        assert_eq!(db.future_events().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_future_events_is_restartable() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let query = db.future_events();
        assert!(query.fetch().await.unwrap().is_empty());

        db.insert_event(&make_test_event("new", Utc::now() + Duration::hours(2)))
            .await
            .unwrap();
        assert_eq!(ids(&query.fetch().await.unwrap()), vec!["new"]);

        db.delete_event("new").await.unwrap();
        assert!(query.fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_future_events_drops_event_once_time_passes() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        db.insert_event(&make_test_event("imminent", Utc::now() + Duration::milliseconds(300)))
            .await
            .unwrap();

        let query = db.future_events();
        assert_eq!(query.count().await.unwrap(), 1);

        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        assert_eq!(query.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_future_events_limit() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let now = Utc::now();
        for day in 1..=5 {
            db.insert_event(&make_test_event(&format!("e{day}"), now + Duration::days(day)))
                .await
                .unwrap();
        }

        let first_two = db.future_events().limit(2).fetch().await.unwrap();
        assert_eq!(ids(&first_two), vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn test_list_events_ordered_by_time() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let now = Utc::now();
        db.insert_event(&make_test_event("b", now + Duration::days(2))).await.unwrap();
        db.insert_event(&make_test_event("a", now - Duration::days(2))).await.unwrap();
        db.insert_event(&make_test_event("c", now + Duration::days(9))).await.unwrap();

        let all = db.list_events().await.unwrap();
        assert_eq!(ids(&all), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_upsert_updates_fields() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let event = make_test_event("3001", Utc::now() + Duration::days(3));
        db.upsert_event(&event).await.unwrap();

        let changed = Event { rsvps: 80, waitlist_count: 12, status: "past".to_string(), ..event.clone() };
        db.upsert_event(&changed).await.unwrap();

        let retrieved = db.get_event("3001").await.unwrap().unwrap();
        assert_eq!(retrieved, changed);
        assert_eq!(db.list_events().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_event() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        db.insert_event(&make_test_event("gone", Utc::now())).await.unwrap();

        assert!(db.delete_event("gone").await.unwrap());
        assert!(!db.delete_event("gone").await.unwrap());
        assert!(db.get_event("gone").await.unwrap().is_none());
    }

    #[test]
    fn test_display_is_name() {
        let event = make_test_event("4001", Utc::now());
        assert_eq!(event.to_string(), "Python Meetup 4001");
    }
}
