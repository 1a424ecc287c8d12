//! Wall-clock budget for one search.
//!
//! The back-off loop bounds how many link queries a search issues, but not
//! how long they take. A [`Deadline`] is created once per search and handed
//! to every collaborator call and to the loop's continuation check.

use std::time::{Duration, Instant};

use crate::collaborators::CollaboratorError;

/// A point in time after which a search should stop issuing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub const fn none() -> Self {
        Self { expires_at: None }
    }

    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(budget),
        }
    }

    /// A deadline from an optional budget; `None` never expires.
    pub fn from_budget(budget: Option<Duration>) -> Self {
        budget.map_or_else(Self::none, Self::after)
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    /// Time left before expiry, or `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
    }

    /// Fail with [`CollaboratorError::DeadlineExceeded`] once expired.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError::DeadlineExceeded`] if the deadline has
    /// passed.
    pub fn check(&self) -> Result<(), CollaboratorError> {
        if self.is_expired() {
            Err(CollaboratorError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
