//! One unit of tracking work

use serde::Serialize;

use crate::error::{RankError, RankResult};
use crate::matcher::MatchTarget;

/// A keyword search looking for one place. Immutable once built, and only
/// built through `new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTask {
    keyword: String,
    target_name: String,
    target_id: Option<String>,
    max_rank: i32,
}

impl SearchTask {
    /// # Errors
    ///
    /// Returns a configuration error when the keyword is blank, or when both
    /// the target name and the target id are blank.
    pub fn new(
        keyword: impl Into<String>,
        target_name: impl Into<String>,
        target_id: Option<String>,
        max_rank: i32,
    ) -> RankResult<Self> {
        let keyword = keyword.into().trim().to_string();
        let target_name = target_name.into().trim().to_string();
        let target_id = target_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        if keyword.is_empty() {
            return Err(RankError::config("empty keyword"));
        }
        if target_name.is_empty() && target_id.is_none() {
            return Err(RankError::config(format!(
                "task '{keyword}' needs a target name or a target id"
            )));
        }

        Ok(Self {
            keyword,
            target_name,
            target_id,
            max_rank,
        })
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    #[must_use]
    pub fn max_rank(&self) -> i32 {
        self.max_rank
    }

    #[must_use]
    pub fn target(&self) -> MatchTarget {
        MatchTarget::new(self.target_name.clone(), self.target_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        assert!(matches!(
            SearchTask::new("  ", "Target", None, 10),
            Err(RankError::Configuration(_))
        ));
        assert!(matches!(
            SearchTask::new("강남 맛집", "", Some(" ".into()), 10),
            Err(RankError::Configuration(_))
        ));
    }

    #[test]
    fn id_alone_is_enough() {
        let task = SearchTask::new("강남 맛집", "", Some("12345".into()), 50).unwrap();
        assert_eq!(task.target_id(), Some("12345"));
        assert_eq!(task.target().id.as_deref(), Some("12345"));
    }
}
