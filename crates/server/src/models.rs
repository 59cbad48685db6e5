use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on `question_text` and `choice_text`, in characters.
pub const MAX_TEXT_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i32,
    pub question_text: String,
    pub pub_text: DateTime<Utc>,
}

impl Question {
    /// True when the question went out within the last day, counting both ends.
    pub fn was_published_recently_at(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_text && self.pub_text <= now
    }

    pub fn was_published_recently(&self) -> bool {
        self.was_published_recently_at(Utc::now())
    }

    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.pub_text <= now
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.question_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i32,
    pub question_id: i32,
    pub choice_text: String,
    pub votes: i32,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.choice_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionInsert {
    pub question_text: String,
    pub pub_text: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceInsert {
    pub question_id: i32,
    pub choice_text: String,
    pub votes: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceUpdate {
    pub choice_text: String,
    pub votes: i32,
}

/// Checks the column bound shared by both record types.
pub fn text_fits(value: &str) -> bool {
    value.chars().count() <= MAX_TEXT_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn question_at(pub_text: DateTime<Utc>) -> Question {
        Question {
            id: 1,
            question_text: "What's new?".into(),
            pub_text,
        }
    }

    #[test]
    fn future_question_is_not_recent() {
        let time = Utc::now() + Duration::days(30);
        assert!(!question_at(time).was_published_recently());
    }

    #[test]
    fn old_question_is_not_recent() {
        let time = Utc::now() - Duration::days(1) - Duration::seconds(1);
        assert!(!question_at(time).was_published_recently());
    }

    #[test]
    fn question_within_last_day_is_recent() {
        let time = Utc::now() - Duration::hours(23) - Duration::minutes(59) - Duration::seconds(59);
        assert!(question_at(time).was_published_recently());
    }

    #[rstest]
    #[case::exactly_now(Duration::zero(), true)]
    #[case::exactly_one_day_ago(Duration::days(-1), true)]
    #[case::second_past_lower_bound(Duration::days(-1) - Duration::seconds(1), false)]
    #[case::second_in_future(Duration::seconds(1), false)]
    #[case::ten_days_ago(Duration::days(-10), false)]
    fn recency_window_bounds(#[case] offset: Duration, #[case] expected: bool) {
        let now = Utc::now();
        assert_eq!(question_at(now + offset).was_published_recently_at(now), expected);
    }

    #[test]
    fn published_includes_now_but_not_future() {
        let now = Utc::now();
        assert!(question_at(now).is_published_at(now));
        assert!(question_at(now - Duration::days(10)).is_published_at(now));
        assert!(!question_at(now + Duration::seconds(1)).is_published_at(now));
    }

    #[test]
    fn displays_as_its_text() {
        let choice = Choice {
            id: 3,
            question_id: 1,
            choice_text: "The sky".into(),
            votes: 0,
        };
        assert_eq!(question_at(Utc::now()).to_string(), "What's new?");
        assert_eq!(choice.to_string(), "The sky");
    }

    #[test]
    fn text_bound_counts_characters() {
        assert!(text_fits(&"é".repeat(MAX_TEXT_LENGTH)));
        assert!(!text_fits(&"a".repeat(MAX_TEXT_LENGTH + 1)));
    }
}
