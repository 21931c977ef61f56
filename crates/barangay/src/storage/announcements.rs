//! Announcements and the publish/archive sweep.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{
    Announcement, AnnouncementStatus, AnnouncementUpdate, NewAnnouncement, RefreshOutcome,
};

use super::{column_enum, column_opt_timestamp, column_timestamp, format_timestamp, Storage};

const SELECT_ANNOUNCEMENT: &str = r"
    SELECT id, title, body, category, status, publish_at, archive_at, author,
           created_at, updated_at
    FROM announcements
";

impl Storage {
    /// Post an announcement.
    ///
    /// The initial status follows from `publish_at` and `publish_now`. An
    /// announcement published immediately gets `publish_at = now`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank text or a bad window, or a
    /// database error.
    pub fn create_announcement(
        &self,
        input: &NewAnnouncement,
        author: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Announcement> {
        let announcement = input.normalized(now)?;
        let status =
            AnnouncementStatus::initial(announcement.publish_at, announcement.publish_now, now);
        let publish_at = match (announcement.publish_at, status) {
            (None, AnnouncementStatus::Published) => Some(now),
            (publish_at, _) => publish_at,
        };

        self.conn.execute(
            r"
            INSERT INTO announcements (
                title, body, category, status, publish_at, archive_at, author,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ",
            params![
                announcement.title,
                announcement.body,
                announcement.category.as_str(),
                status.as_str(),
                publish_at.map(format_timestamp),
                announcement.archive_at.map(format_timestamp),
                author,
                format_timestamp(now),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("Posted announcement {} ({})", id, status);
        self.get_announcement(id)
    }

    /// Get an announcement by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn get_announcement(&self, id: i64) -> Result<Announcement> {
        self.conn
            .query_row(
                &format!("{SELECT_ANNOUNCEMENT} WHERE id = ?1"),
                [id],
                row_to_announcement,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("announcement", id))
    }

    /// List announcements, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_announcements(
        &self,
        status: Option<AnnouncementStatus>,
    ) -> Result<Vec<Announcement>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_ANNOUNCEMENT} WHERE ?1 IS NULL OR status = ?1 ORDER BY created_at DESC, id DESC"
        ))?;
        let announcements = stmt
            .query_map([status.map(AnnouncementStatus::as_str)], row_to_announcement)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(announcements)
    }

    /// Announcements residents can see right now, most recently published
    /// first.
    ///
    /// Applies any due publish/archive transitions before reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_public_announcements(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>> {
        self.refresh_announcements(now)?;

        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_ANNOUNCEMENT} WHERE status = ?1 ORDER BY publish_at DESC, id DESC"
        ))?;
        let announcements = stmt
            .query_map([AnnouncementStatus::Published.as_str()], row_to_announcement)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(announcements)
    }

    /// Edit an announcement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], a validation error, or a database error.
    pub fn update_announcement(
        &self,
        id: i64,
        update: AnnouncementUpdate,
        now: DateTime<Utc>,
    ) -> Result<Announcement> {
        let current = self.get_announcement(id)?;
        let merged = update.apply_to(&current, now)?;

        self.conn.execute(
            r"
            UPDATE announcements SET
                title = ?2, body = ?3, category = ?4, status = ?5, publish_at = ?6,
                archive_at = ?7, updated_at = ?8
            WHERE id = ?1
            ",
            params![
                id,
                merged.title,
                merged.body,
                merged.category.as_str(),
                merged.status.as_str(),
                merged.publish_at.map(format_timestamp),
                merged.archive_at.map(format_timestamp),
                format_timestamp(merged.updated_at),
            ],
        )?;

        debug!("Updated announcement {}", id);
        self.get_announcement(id)
    }

    /// Archive an announcement now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::InvalidTransition`] if it is
    /// already archived, or a database error.
    pub fn archive_announcement(&self, id: i64, now: DateTime<Utc>) -> Result<Announcement> {
        let current = self.get_announcement(id)?;
        if current.status == AnnouncementStatus::Archived {
            return Err(Error::invalid_transition(
                "announcement",
                current.status,
                AnnouncementStatus::Archived,
            ));
        }

        let now = format_timestamp(now);
        self.conn.execute(
            "UPDATE announcements SET status = ?2, archive_at = ?3, updated_at = ?3 WHERE id = ?1",
            params![id, AnnouncementStatus::Archived.as_str(), now],
        )?;

        info!("Archived announcement {}", id);
        self.get_announcement(id)
    }

    /// Delete an announcement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn delete_announcement(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM announcements WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::not_found("announcement", id));
        }
        info!("Deleted announcement {}", id);
        Ok(())
    }

    /// Publish scheduled announcements whose time has come and archive
    /// published ones past their archive time.
    ///
    /// Safe to run repeatedly; a second run with the same `now` moves
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn refresh_announcements(&self, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        let now = format_timestamp(now);

        let tx = self.conn.unchecked_transaction()?;
        let published = tx.execute(
            r"
            UPDATE announcements SET status = ?1, updated_at = ?3
            WHERE status = ?2 AND publish_at IS NOT NULL AND publish_at <= ?3
            ",
            params![
                AnnouncementStatus::Published.as_str(),
                AnnouncementStatus::Scheduled.as_str(),
                now
            ],
        )?;
        let archived = tx.execute(
            r"
            UPDATE announcements SET status = ?1, updated_at = ?3
            WHERE status = ?2 AND archive_at IS NOT NULL AND archive_at <= ?3
            ",
            params![
                AnnouncementStatus::Archived.as_str(),
                AnnouncementStatus::Published.as_str(),
                now
            ],
        )?;
        tx.commit()?;

        let outcome = RefreshOutcome {
            published,
            archived,
        };
        if published > 0 || archived > 0 {
            info!(
                "Announcement refresh: {} published, {} archived",
                published, archived
            );
        }
        Ok(outcome)
    }
}

fn row_to_announcement(row: &Row<'_>) -> rusqlite::Result<Announcement> {
    Ok(Announcement {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        category: column_enum(row, 3)?,
        status: column_enum(row, 4)?,
        publish_at: column_opt_timestamp(row, 5)?,
        archive_at: column_opt_timestamp(row, 6)?,
        author: row.get(7)?,
        created_at: column_timestamp(row, 8)?,
        updated_at: column_timestamp(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::storage;
    use super::*;
    use crate::models::AnnouncementCategory;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn input(
        publish_at: Option<DateTime<Utc>>,
        archive_at: Option<DateTime<Utc>>,
    ) -> NewAnnouncement {
        NewAnnouncement {
            title: "Clean-up drive".to_string(),
            body: "Saturday 7 AM at the covered court.".to_string(),
            category: AnnouncementCategory::Event,
            publish_at,
            archive_at,
            publish_now: false,
        }
    }

    #[test]
    fn test_create_statuses() {
        let storage = storage();

        let draft = storage
            .create_announcement(&input(None, None), Some("admin"), now())
            .unwrap();
        assert_eq!(draft.status, AnnouncementStatus::Draft);
        assert_eq!(draft.author.as_deref(), Some("admin"));

        let scheduled = storage
            .create_announcement(&input(Some(now() + Duration::hours(2)), None), None, now())
            .unwrap();
        assert_eq!(scheduled.status, AnnouncementStatus::Scheduled);

        let mut immediate = input(None, None);
        immediate.publish_now = true;
        let published = storage
            .create_announcement(&immediate, None, now())
            .unwrap();
        assert_eq!(published.status, AnnouncementStatus::Published);
        assert_eq!(published.publish_at, Some(now()));
    }

    #[test]
    fn test_create_rejects_bad_window() {
        let err = storage()
            .create_announcement(
                &input(Some(now() + Duration::hours(2)), Some(now() + Duration::hours(1))),
                None,
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_refresh_publishes_and_archives() {
        let storage = storage();
        let scheduled = storage
            .create_announcement(
                &input(Some(now() + Duration::hours(1)), Some(now() + Duration::hours(3))),
                None,
                now(),
            )
            .unwrap();

        let outcome = storage.refresh_announcements(now()).unwrap();
        assert_eq!(outcome, RefreshOutcome::default());

        let later = now() + Duration::hours(2);
        let outcome = storage.refresh_announcements(later).unwrap();
        assert_eq!(outcome.published, 1);
        assert_eq!(outcome.archived, 0);
        assert_eq!(
            storage.get_announcement(scheduled.id).unwrap().status,
            AnnouncementStatus::Published
        );

        // Idempotent
        assert_eq!(
            storage.refresh_announcements(later).unwrap(),
            RefreshOutcome::default()
        );

        let outcome = storage
            .refresh_announcements(now() + Duration::hours(3))
            .unwrap();
        assert_eq!(outcome.archived, 1);
        assert_eq!(
            storage.get_announcement(scheduled.id).unwrap().status,
            AnnouncementStatus::Archived
        );
    }

    #[test]
    fn test_list_public_runs_refresh() {
        let storage = storage();
        storage
            .create_announcement(&input(Some(now() + Duration::hours(1)), None), None, now())
            .unwrap();
        storage
            .create_announcement(&input(None, None), None, now())
            .unwrap();

        assert!(storage.list_public_announcements(now()).unwrap().is_empty());

        let visible = storage
            .list_public_announcements(now() + Duration::hours(1))
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].status, AnnouncementStatus::Published);
    }

    #[test]
    fn test_list_by_status() {
        let storage = storage();
        storage
            .create_announcement(&input(None, None), None, now())
            .unwrap();
        let mut immediate = input(None, None);
        immediate.publish_now = true;
        storage
            .create_announcement(&immediate, None, now())
            .unwrap();

        assert_eq!(storage.list_announcements(None).unwrap().len(), 2);
        let drafts = storage
            .list_announcements(Some(AnnouncementStatus::Draft))
            .unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_update_reschedules_draft() {
        let storage = storage();
        let draft = storage
            .create_announcement(&input(None, None), None, now())
            .unwrap();

        let update = AnnouncementUpdate {
            title: Some("Clean-up drive (moved)".to_string()),
            publish_at: Some(now() + Duration::days(1)),
            ..AnnouncementUpdate::default()
        };
        let updated = storage.update_announcement(draft.id, update, now()).unwrap();
        assert_eq!(updated.status, AnnouncementStatus::Scheduled);
        assert_eq!(updated.title, "Clean-up drive (moved)");
    }

    #[test]
    fn test_archive_and_delete() {
        let storage = storage();
        let draft = storage
            .create_announcement(&input(None, None), None, now())
            .unwrap();

        let archived = storage.archive_announcement(draft.id, now()).unwrap();
        assert_eq!(archived.status, AnnouncementStatus::Archived);
        assert_eq!(archived.archive_at, Some(now()));
        assert!(matches!(
            storage.archive_announcement(draft.id, now()).unwrap_err(),
            Error::InvalidTransition { .. }
        ));

        storage.delete_announcement(draft.id).unwrap();
        assert!(storage.get_announcement(draft.id).unwrap_err().is_not_found());
        assert!(storage.delete_announcement(draft.id).unwrap_err().is_not_found());
    }
}
