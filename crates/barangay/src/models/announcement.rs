//! Announcements posted to residents.
//!
//! An announcement is either published immediately, scheduled for a
//! `publish_at` time, or kept as a draft. Scheduled announcements become
//! published once `publish_at` passes, and published ones are archived once
//! `archive_at` passes. Those two moves are applied by
//! `Storage::refresh_announcements`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::required;

/// Topic of an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementCategory {
    /// General notice.
    #[default]
    General,
    /// Community event.
    Event,
    /// Advisory (health, weather, schedule changes).
    Advisory,
    /// Emergency notice.
    Emergency,
}

impl AnnouncementCategory {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Event => "event",
            Self::Advisory => "advisory",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for AnnouncementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnouncementCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "general" => Ok(Self::General),
            "event" => Ok(Self::Event),
            "advisory" => Ok(Self::Advisory),
            "emergency" => Ok(Self::Emergency),
            other => Err(Error::validation(format!(
                "unknown announcement category: {other}"
            ))),
        }
    }
}

/// Visibility status of an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementStatus {
    /// Not visible and not scheduled.
    Draft,
    /// Will be published at `publish_at`.
    Scheduled,
    /// Visible to the public.
    Published,
    /// No longer visible.
    Archived,
}

impl AnnouncementStatus {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    /// Status for a new (or rescheduled) announcement.
    #[must_use]
    pub fn initial(
        publish_at: Option<DateTime<Utc>>,
        publish_now: bool,
        now: DateTime<Utc>,
    ) -> Self {
        match publish_at {
            Some(at) if at > now => Self::Scheduled,
            Some(_) => Self::Published,
            None if publish_now => Self::Published,
            None => Self::Draft,
        }
    }
}

impl fmt::Display for AnnouncementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnouncementStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(Error::validation(format!(
                "unknown announcement status: {other}"
            ))),
        }
    }
}

/// An announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Row id.
    pub id: i64,
    /// Headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Topic.
    pub category: AnnouncementCategory,
    /// Visibility status.
    pub status: AnnouncementStatus,
    /// When it becomes (or became) visible.
    pub publish_at: Option<DateTime<Utc>>,
    /// When it stops being visible.
    pub archive_at: Option<DateTime<Utc>>,
    /// Username of the author.
    pub author: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Input for posting an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnnouncement {
    /// Headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Topic.
    #[serde(default)]
    pub category: AnnouncementCategory,
    /// Scheduled publish time.
    #[serde(default)]
    pub publish_at: Option<DateTime<Utc>>,
    /// Scheduled archive time.
    #[serde(default)]
    pub archive_at: Option<DateTime<Utc>>,
    /// Publish right away when no `publish_at` is given.
    #[serde(default)]
    pub publish_now: bool,
}

impl NewAnnouncement {
    /// Trim and validate.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank text or an archive time that
    /// does not come after the publish time.
    pub fn normalized(&self, now: DateTime<Utc>) -> Result<Self> {
        let normalized = Self {
            title: required("title", &self.title)?,
            body: required("body", &self.body)?,
            ..self.clone()
        };
        check_window(normalized.publish_at, normalized.archive_at, now)?;
        Ok(normalized)
    }
}

/// Partial update of an announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementUpdate {
    /// Headline.
    pub title: Option<String>,
    /// Body text.
    pub body: Option<String>,
    /// Topic.
    pub category: Option<AnnouncementCategory>,
    /// New publish time (drafts and scheduled announcements only).
    pub publish_at: Option<DateTime<Utc>>,
    /// New archive time.
    pub archive_at: Option<DateTime<Utc>>,
}

impl AnnouncementUpdate {
    /// Merge over an existing announcement, recomputing status when the
    /// publish time moves.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank text, an invalid window, or a
    /// publish time change on an announcement that is already out.
    pub fn apply_to(self, current: &Announcement, now: DateTime<Utc>) -> Result<Announcement> {
        let mut merged = current.clone();
        if let Some(title) = self.title {
            merged.title = required("title", &title)?;
        }
        if let Some(body) = self.body {
            merged.body = required("body", &body)?;
        }
        if let Some(category) = self.category {
            merged.category = category;
        }
        let window_changed = self.publish_at.is_some() || self.archive_at.is_some();
        if let Some(publish_at) = self.publish_at {
            match current.status {
                AnnouncementStatus::Draft | AnnouncementStatus::Scheduled => {
                    merged.publish_at = Some(publish_at);
                    merged.status = AnnouncementStatus::initial(Some(publish_at), false, now);
                }
                status => {
                    return Err(Error::validation(format!(
                        "cannot reschedule an announcement that is {status}"
                    )));
                }
            }
        }
        if let Some(archive_at) = self.archive_at {
            merged.archive_at = Some(archive_at);
        }
        if window_changed {
            check_window(merged.publish_at, merged.archive_at, now)?;
        }
        merged.updated_at = now;
        Ok(merged)
    }
}

/// `archive_at` must come after `publish_at` (or after now when publishing
/// immediately).
fn check_window(
    publish_at: Option<DateTime<Utc>>,
    archive_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<()> {
    if let Some(archive_at) = archive_at {
        let start = publish_at.unwrap_or(now);
        if archive_at <= start {
            return Err(Error::validation("archive_at must be after publish_at"));
        }
    }
    Ok(())
}

/// Counts of announcements moved by a refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    /// Scheduled announcements that were published.
    pub published: usize,
    /// Published announcements that were archived.
    pub archived: usize,
}
