//! Sponsor references and sponsor-to-meetup links.
//!
//! Sponsors are owned elsewhere; the store keeps only the minimal row a link
//! needs to resolve against. A meetup has zero or more links, and the same
//! sponsor may be linked to the same meetup more than once with different notes.

use super::connection::MeetupDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row};

/// Identifier of a sponsor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SponsorId(pub i64);

/// Minimal sponsor reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sponsor {
    pub id: SponsorId,
    pub name: String,
}

/// Qualifies how a sponsor helped a meetup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorLink {
    pub id: i64,
    pub sponsor_id: SponsorId,
    pub meetup_id: String,
    pub note: String,
}

impl SponsorLink {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SponsorLink {
            id: row.get(0)?,
            sponsor_id: SponsorId(row.get(1)?),
            meetup_id: row.get(2)?,
            note: row.get(3)?,
        })
    }
}

impl MeetupDb {
    /// Create a sponsor reference row.
    pub async fn add_sponsor(&self, name: &str) -> Result<Sponsor, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("sponsor name must not be empty".to_string()));
        }

        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Sponsor, Error> {
                conn.execute("INSERT INTO sponsors (name) VALUES (?1)", params![name])?;
                Ok(Sponsor { id: SponsorId(conn.last_insert_rowid()), name })
            })
            .await
            .map_err(Error::from)
    }

    /// Link a sponsor to a meetup with a free-text note.
    ///
    /// # Errors
    ///
    /// Returns `Error::ForeignKeyViolation` if either side does not exist.
    pub async fn link_sponsor(&self, sponsor_id: SponsorId, meetup_id: &str, note: &str) -> Result<SponsorLink, Error> {
        let meetup_id = meetup_id.to_string();
        let note = note.to_string();
        self.conn
            .call(move |conn| -> Result<SponsorLink, Error> {
                conn.execute(
                    "INSERT INTO meetup_sponsor_links (sponsor_id, meetup_id, note) VALUES (?1, ?2, ?3)",
                    params![sponsor_id.0, &meetup_id, &note],
                )?;
                Ok(SponsorLink { id: conn.last_insert_rowid(), sponsor_id, meetup_id, note })
            })
            .await
            .map_err(Error::from)
    }

    /// Links for one meetup, in the order they were created.
    pub async fn sponsor_links_for_meetup(&self, meetup_id: &str) -> Result<Vec<SponsorLink>, Error> {
        let meetup_id = meetup_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<SponsorLink>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, sponsor_id, meetup_id, note FROM meetup_sponsor_links
                    WHERE meetup_id = ?1 ORDER BY id ASC",
                )?;
                let links = stmt
                    .query_map(params![meetup_id], SponsorLink::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(links)
            })
            .await
            .map_err(Error::from)
    }

    /// Distinct sponsors linked to one meetup, ordered by name.
    pub async fn sponsors_for_meetup(&self, meetup_id: &str) -> Result<Vec<Sponsor>, Error> {
        let meetup_id = meetup_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<Sponsor>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT s.id, s.name FROM sponsors s
                    JOIN meetup_sponsor_links l ON l.sponsor_id = s.id
                    WHERE l.meetup_id = ?1
                    ORDER BY s.name ASC, s.id ASC",
                )?;
                let sponsors = stmt
                    .query_map(params![meetup_id], |row| {
                        Ok(Sponsor { id: SponsorId(row.get(0)?), name: row.get(1)? })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(sponsors)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one link.
    ///
    /// Returns whether a row was removed.
    pub async fn unlink_sponsor(&self, link_id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM meetup_sponsor_links WHERE id = ?1", params![link_id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::events::tests::make_test_event;
    use chrono::{Duration, Utc};

    async fn seeded() -> (MeetupDb, Sponsor) {
        let db = MeetupDb::open_in_memory().await.unwrap();
        db.insert_event(&make_test_event("5001", Utc::now() + Duration::days(1)))
            .await
            .unwrap();
        let sponsor = db.add_sponsor("Python Software Foundation").await.unwrap();
        (db, sponsor)
    }

    #[tokio::test]
    async fn test_link_and_list() {
        let (db, sponsor) = seeded().await;

        let link = db.link_sponsor(sponsor.id, "5001", "Venue").await.unwrap();
        assert_eq!(link.note, "Venue");

        let links = db.sponsor_links_for_meetup("5001").await.unwrap();
        assert_eq!(links, vec![link]);
        assert_eq!(db.sponsors_for_meetup("5001").await.unwrap(), vec![sponsor]);
    }

    #[tokio::test]
    async fn test_meetup_without_links() {
        let (db, _) = seeded().await;
        assert!(db.sponsor_links_for_meetup("5001").await.unwrap().is_empty());
        assert!(db.sponsors_for_meetup("5001").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_pair_linked_twice() {
        let (db, sponsor) = seeded().await;
        db.link_sponsor(sponsor.id, "5001", "Venue").await.unwrap();
        db.link_sponsor(sponsor.id, "5001", "").await.unwrap();

        let links = db.sponsor_links_for_meetup("5001").await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].note, "");
        assert_eq!(db.sponsors_for_meetup("5001").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_link_unknown_sponsor() {
        let (db, _) = seeded().await;
        let result = db.link_sponsor(SponsorId(9999), "5001", "").await;
        assert!(matches!(result, Err(Error::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn test_link_unknown_meetup() {
        let (db, sponsor) = seeded().await;
        let result = db.link_sponsor(sponsor.id, "missing", "").await;
        assert!(matches!(result, Err(Error::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn test_unlink() {
        let (db, sponsor) = seeded().await;
        let link = db.link_sponsor(sponsor.id, "5001", "Pizza").await.unwrap();

        assert!(db.unlink_sponsor(link.id).await.unwrap());
        assert!(!db.unlink_sponsor(link.id).await.unwrap());
        assert!(db.sponsor_links_for_meetup("5001").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_meetup_cascades_links() {
        let (db, sponsor) = seeded().await;
        let link = db.link_sponsor(sponsor.id, "5001", "Venue").await.unwrap();

        db.delete_event("5001").await.unwrap();
        assert!(db.sponsor_links_for_meetup("5001").await.unwrap().is_empty());
        assert!(!db.unlink_sponsor(link.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_keeps_links() {
        let (db, sponsor) = seeded().await;
        db.link_sponsor(sponsor.id, "5001", "Venue").await.unwrap();

        let mut event = db.get_event("5001").await.unwrap().unwrap();
        event.rsvps = 99;
        db.upsert_event(&event).await.unwrap();

        assert_eq!(db.sponsor_links_for_meetup("5001").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_sponsor_rejects_empty_name() {
        let db = MeetupDb::open_in_memory().await.unwrap();
        let result = db.add_sponsor("").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
