//! Typed ID wrappers.
//!
//! Submissions are keyed by the catalog's autoincrement integer. Wrapping it
//! keeps raw row ids from other tables (e.g. the superseded-file ledger) from
//! being passed where a submission is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a catalog submission.
///
/// Assigned by the catalog on insert and never reused. The same value appears
/// in the public image locator (`/image/{id}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(i64);

impl SubmissionId {
    /// Raw integer value as stored in the catalog.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for SubmissionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<SubmissionId> for i64 {
    fn from(id: SubmissionId) -> Self {
        id.0
    }
}

impl FromStr for SubmissionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_id_roundtrip() {
        let id = SubmissionId::from(42);
        assert_eq!(id.get(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_submission_id_parse() {
        assert_eq!("17".parse::<SubmissionId>().unwrap(), SubmissionId::from(17));
        assert_eq!(" 5 ".parse::<SubmissionId>().unwrap(), SubmissionId::from(5));
        assert!("abc".parse::<SubmissionId>().is_err());
        assert!("".parse::<SubmissionId>().is_err());
    }

    #[test]
    fn test_submission_id_ordering() {
        let mut ids = vec![SubmissionId::from(2), SubmissionId::from(9), SubmissionId::from(4)];
        ids.sort_by(|a, b| b.cmp(a));
        assert_eq!(ids, vec![SubmissionId::from(9), SubmissionId::from(4), SubmissionId::from(2)]);
    }

    #[test]
    fn test_submission_id_serde_transparent() {
        let id = SubmissionId::from(12);
        assert_eq!(serde_json::to_string(&id).unwrap(), "12");
        let back: SubmissionId = serde_json::from_str("12").unwrap();
        assert_eq!(back, id);
    }
}
