//! User-visible notifications.
//!
//! Every user-initiated write ends in a success or error [`Notice`]. Notices
//! are addressed to an [`Audience`]: the signed-in user who triggered the
//! action, or the project when the caller is anonymous (editor sessions and
//! their background saves act for the project). Each audience has its own
//! bounded queue on the [`NoticeBoard`], drained with `GET /notices`. Every
//! notice is also logged.

use std::collections::VecDeque;
use std::sync::Arc;

use archboard_core::ProjectId;
use archboard_storage::UserId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// Oldest notices are dropped past this many per audience.
const MAX_QUEUED: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Who a notice is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    User(UserId),
    Project(ProjectId),
}

/// Per-audience notice queues. Cloning shares the queues.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    queues: Arc<DashMap<Audience, VecDeque<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        NoticeBoard::default()
    }

    /// A handle that posts to `audience`.
    pub fn notices_for(&self, audience: Audience) -> Notices {
        Notices {
            board: self.clone(),
            audience,
        }
    }

    /// Removes and returns every notice queued for `audience`, oldest first.
    pub fn drain(&self, audience: &Audience) -> Vec<Notice> {
        self.queues
            .remove(audience)
            .map(|(_, queue)| queue.into_iter().collect())
            .unwrap_or_default()
    }

    /// Drains several audiences into one list ordered by time.
    pub fn drain_all<'a>(&self, audiences: impl IntoIterator<Item = &'a Audience>) -> Vec<Notice> {
        let mut notices: Vec<Notice> = audiences
            .into_iter()
            .flat_map(|audience| self.drain(audience))
            .collect();
        notices.sort_by_key(|notice| notice.at);
        notices
    }

    fn push(&self, audience: &Audience, level: NoticeLevel, message: String) {
        let mut queue = self.queues.entry(audience.clone()).or_default();
        if queue.len() == MAX_QUEUED {
            queue.pop_front();
        }
        queue.push_back(Notice {
            level,
            message,
            at: Utc::now(),
        });
    }
}

/// Posting handle bound to one audience. Cloning shares the board.
#[derive(Debug, Clone)]
pub struct Notices {
    board: NoticeBoard,
    audience: Audience,
}

impl Notices {
    /// A handle on a board of its own, addressed to the default project.
    pub fn new() -> Self {
        NoticeBoard::new().notices_for(Audience::Project(ProjectId::default()))
    }

    pub fn audience(&self) -> &Audience {
        &self.audience
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(audience = ?self.audience, "{}", message);
        self.board.push(&self.audience, NoticeLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(audience = ?self.audience, "{}", message);
        self.board.push(&self.audience, NoticeLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(audience = ?self.audience, "{}", message);
        self.board.push(&self.audience, NoticeLevel::Error, message);
    }

    /// Removes and returns this audience's notices, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.board.drain(&self.audience)
    }

    /// Returns this audience's notices without removing them.
    pub fn peek(&self) -> Vec<Notice> {
        self.board
            .queues
            .get(&self.audience)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for Notices {
    fn default() -> Self {
        Notices::new()
    }
}
