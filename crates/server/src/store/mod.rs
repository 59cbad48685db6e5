//! Record store for questions and choices.
//!
//! Handlers are generic over [`Store`], so the same routes run against
//! PostgreSQL in production and the in-memory store in tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::models::{Choice, ChoiceInsert, ChoiceUpdate, Question, QuestionInsert};
use chrono::{DateTime, Utc};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionOrder {
    #[default]
    IdDesc,
    PubTextAsc,
    PubTextDesc,
    QuestionTextAsc,
    QuestionTextDesc,
}

impl QuestionOrder {
    /// Ordering on a stored column; `None` for columns that cannot be sorted.
    pub fn by(column: &str, descending: bool) -> Option<Self> {
        match (column, descending) {
            ("pub_text", false) => Some(Self::PubTextAsc),
            ("pub_text", true) => Some(Self::PubTextDesc),
            ("question_text", false) => Some(Self::QuestionTextAsc),
            ("question_text", true) => Some(Self::QuestionTextDesc),
            _ => None,
        }
    }
}

/// Filter and ordering for question listings. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct QuestionQuery {
    pub pub_text_lte: Option<DateTime<Utc>>,
    pub pub_text_gte: Option<DateTime<Utc>>,
    pub pub_text_lt: Option<DateTime<Utc>>,
    /// Every term must appear in `question_text`, ignoring case.
    pub text_terms: Vec<String>,
    pub order: QuestionOrder,
}

impl QuestionQuery {
    pub fn published_before(now: DateTime<Utc>) -> Self {
        Self {
            pub_text_lte: Some(now),
            order: QuestionOrder::PubTextDesc,
            ..Default::default()
        }
    }

    pub fn matches(&self, question: &Question) -> bool {
        if self.pub_text_lte.is_some_and(|t| question.pub_text > t) {
            return false;
        }
        if self.pub_text_gte.is_some_and(|t| question.pub_text < t) {
            return false;
        }
        if self.pub_text_lt.is_some_and(|t| question.pub_text >= t) {
            return false;
        }
        let text = question.question_text.to_lowercase();
        self.text_terms.iter().all(|term| text.contains(&term.to_lowercase()))
    }
}

pub trait QuestionCommon {
    fn insert_question(&self, question: QuestionInsert) -> impl Future<Output = Result<Question, AppError>> + Send;
    fn update_question(&self, id: i32, question: QuestionInsert) -> impl Future<Output = Result<Option<Question>, AppError>> + Send;
    fn get_question(&self, id: i32) -> impl Future<Output = Result<Option<Question>, AppError>> + Send;
    fn query_questions(&self, query: &QuestionQuery) -> impl Future<Output = Result<Vec<Question>, AppError>> + Send;
    fn question_text_exists(&self, question_text: &str) -> impl Future<Output = Result<bool, AppError>> + Send;
    /// Removes the question together with all of its choices.
    fn delete_question(&self, id: i32) -> impl Future<Output = Result<bool, AppError>> + Send;
}

pub trait ChoiceCommon {
    fn insert_choice(&self, choice: ChoiceInsert) -> impl Future<Output = Result<Choice, AppError>> + Send;
    /// Only touches the choice when it belongs to `question_id`.
    fn update_choice(&self, question_id: i32, id: i32, choice: ChoiceUpdate) -> impl Future<Output = Result<Option<Choice>, AppError>> + Send;
    fn delete_choice(&self, question_id: i32, id: i32) -> impl Future<Output = Result<bool, AppError>> + Send;
    fn choices_of(&self, question_id: i32) -> impl Future<Output = Result<Vec<Choice>, AppError>> + Send;
}

pub trait Store: QuestionCommon + ChoiceCommon + Clone + Send + Sync + 'static {
    fn ping(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

pub(crate) fn check_text(field: &str, value: &str) -> Result<(), AppError> {
    if crate::models::text_fits(value) {
        Ok(())
    } else {
        Err(AppError::Constraint(format!(
            "{field} exceeds {} characters",
            crate::models::MAX_TEXT_LENGTH
        )))
    }
}

pub(crate) fn check_votes(votes: i32) -> Result<(), AppError> {
    if votes < 0 {
        return Err(AppError::Constraint("votes must not be negative".into()));
    }
    Ok(())
}
