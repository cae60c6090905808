//! Nickname availability and suggestions
//!
//! Uniqueness is only encouraged at signup time. The check is not
//! transactional with the signup write, so two callers can be offered the
//! same suggestion and both sign up with it.

use std::sync::Arc;

use crate::data::Database;
use crate::error::AppError;

/// Result of an availability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Taken { suggestion: String },
}

/// Suggest `requested` plus one more than the largest numeric suffix seen
/// among `existing` nicknames that start with `requested`.
///
/// A remainder that is empty, not a number, or too large to increment
/// counts as `0`.
pub fn suggest_nickname<S: AsRef<str>>(requested: &str, existing: &[S]) -> String {
    let max_suffix = existing
        .iter()
        .filter_map(|nickname| nickname.as_ref().strip_prefix(requested))
        .map(|suffix| {
            suffix
                .parse::<u64>()
                .ok()
                .filter(|n| *n < u64::MAX)
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0);

    format!("{}{}", requested, max_suffix + 1)
}

pub struct NicknameResolver {
    db: Arc<Database>,
}

impl NicknameResolver {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Check whether `nickname` is free, suggesting an alternative if not
    pub async fn check_availability(&self, nickname: &str) -> Result<Availability, AppError> {
        if !self.db.nickname_exists(nickname).await? {
            return Ok(Availability::Available);
        }

        let existing = self.db.get_nicknames_with_prefix(nickname).await?;
        let suggestion = suggest_nickname(nickname, &existing);
        tracing::debug!(nickname, %suggestion, "Nickname taken");

        Ok(Availability::Taken { suggestion })
    }
}
