//! Update marker: when upstream meetup data was last refreshed.
//!
//! The marker lives in a table that can hold only the row with `id = 1`.
//! [`MeetupDb::tick`] writes it with a single upsert statement, so concurrent
//! ticks never produce a second row.

use super::connection::MeetupDb;
use super::timestamp;
use crate::Error;
use chrono::{DateTime, Duration, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// How far into the past [`MeetupDb::invalidate_marker`] moves the marker.
pub const INVALIDATION_OFFSET_HOURS: i64 = 1;

impl MeetupDb {
    /// Record the current instant as the latest meetup refresh.
    ///
    /// Inserts the marker if absent, otherwise updates it in place.
    pub async fn tick(&self) -> Result<(), Error> {
        let now = timestamp::encode(Utc::now());
        tracing::debug!(updated = %now, "ticking meetup update marker");
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO meetup_update (id, updated) VALUES (1, ?1)
                    ON CONFLICT(id) DO UPDATE SET updated = excluded.updated",
                    params![now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Move the marker one hour into the past so freshness checks see it as stale.
    ///
    /// Only the `updated` column of the existing row is written.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if [`MeetupDb::tick`] has never run.
    pub async fn invalidate_marker(&self) -> Result<(), Error> {
        let stale = timestamp::encode(Utc::now() - Duration::hours(INVALIDATION_OFFSET_HOURS));
        tracing::debug!(updated = %stale, "invalidating meetup update marker");
        let changed = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let changed = conn.execute("UPDATE meetup_update SET updated = ?1 WHERE id = 1", params![stale])?;
                Ok(changed)
            })
            .await
            .map_err(Error::from)?;

        if changed == 0 {
            return Err(Error::NotFound("meetup update marker has not been recorded".to_string()));
        }
        Ok(())
    }

    /// Get the marker timestamp.
    ///
    /// Returns None if the marker has never been ticked.
    pub async fn marker(&self) -> Result<Option<DateTime<Utc>>, Error> {
        self.conn
            .call(|conn| -> Result<Option<DateTime<Utc>>, Error> {
                let result = conn.query_row("SELECT updated FROM meetup_update WHERE id = 1", [], |row| {
                    timestamp::column(row, 0)
                });

                match result {
                    Ok(updated) => Ok(Some(updated)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether meetup data should be refetched.
    ///
    /// True when the marker is absent or at least `max_age` old.
    pub async fn is_marker_stale(&self, max_age: Duration) -> Result<bool, Error> {
        let stale = match self.marker().await? {
            Some(updated) => Utc::now() - updated >= max_age,
            None => true,
        };
        Ok(stale)
    }
}
