use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};

/// The entity a vote or moderation action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Question(Uuid),
    Answer(Uuid),
}

impl VoteTarget {
    pub fn id(&self) -> Uuid {
        match *self {
            VoteTarget::Question(id) | VoteTarget::Answer(id) => id,
        }
    }
}

/// Vote up: 1; vote down: -1; 0 withdraws the vote without deleting the row.
pub fn validate_vote_value(value: i32) -> Result<()> {
    if (-1..=1).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidVoteValue(value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionVote {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub value: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerVote {
    pub id: Uuid,
    pub answer_id: Uuid,
    pub user_id: Uuid,
    pub value: i32,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_three_vote_values() {
        for value in [-1, 0, 1] {
            assert!(validate_vote_value(value).is_ok());
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        for value in [-2, 2, 100, i32::MIN] {
            match validate_vote_value(value) {
                Err(Error::InvalidVoteValue(v)) => assert_eq!(v, value),
                other => panic!("expected InvalidVoteValue, got {:?}", other),
            }
        }
    }
}
