use super::{ChoiceCommon, QuestionCommon, QuestionOrder, QuestionQuery, Store, check_text, check_votes};
use crate::error::AppError;
use crate::models::{Choice, ChoiceInsert, ChoiceUpdate, Question, QuestionInsert};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    questions: BTreeMap<i32, Question>,
    choices: BTreeMap<i32, Choice>,
    last_question_id: i32,
    last_choice_id: i32,
}

/// Process-local store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuestionCommon for MemoryStore {
    async fn insert_question(&self, question: QuestionInsert) -> Result<Question, AppError> {
        check_text("question_text", &question.question_text)?;
        let mut tables = self.tables.write().await;
        tables.last_question_id += 1;
        let question = Question {
            id: tables.last_question_id,
            question_text: question.question_text,
            pub_text: question.pub_text,
        };
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn update_question(&self, id: i32, question: QuestionInsert) -> Result<Option<Question>, AppError> {
        check_text("question_text", &question.question_text)?;
        let mut tables = self.tables.write().await;
        Ok(tables.questions.get_mut(&id).map(|stored| {
            stored.question_text = question.question_text;
            stored.pub_text = question.pub_text;
            stored.clone()
        }))
    }

    async fn get_question(&self, id: i32) -> Result<Option<Question>, AppError> {
        Ok(self.tables.read().await.questions.get(&id).cloned())
    }

    async fn query_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;
        let mut questions: Vec<Question> = tables.questions.values().filter(|q| query.matches(q)).cloned().collect();
        match query.order {
            QuestionOrder::IdDesc => questions.sort_by(|a, b| b.id.cmp(&a.id)),
            QuestionOrder::PubTextAsc => questions.sort_by(|a, b| a.pub_text.cmp(&b.pub_text).then(b.id.cmp(&a.id))),
            QuestionOrder::PubTextDesc => questions.sort_by(|a, b| b.pub_text.cmp(&a.pub_text).then(b.id.cmp(&a.id))),
            QuestionOrder::QuestionTextAsc => questions.sort_by(|a, b| a.question_text.cmp(&b.question_text).then(b.id.cmp(&a.id))),
            QuestionOrder::QuestionTextDesc => questions.sort_by(|a, b| b.question_text.cmp(&a.question_text).then(b.id.cmp(&a.id))),
        }
        Ok(questions)
    }

    async fn question_text_exists(&self, question_text: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.questions.values().any(|q| q.question_text == question_text))
    }

    async fn delete_question(&self, id: i32) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.questions.remove(&id).is_none() {
            return Ok(false);
        }
        tables.choices.retain(|_, choice| choice.question_id != id);
        Ok(true)
    }
}

impl ChoiceCommon for MemoryStore {
    async fn insert_choice(&self, choice: ChoiceInsert) -> Result<Choice, AppError> {
        check_text("choice_text", &choice.choice_text)?;
        check_votes(choice.votes)?;
        let mut tables = self.tables.write().await;
        if !tables.questions.contains_key(&choice.question_id) {
            return Err(AppError::Constraint(format!("question {} does not exist", choice.question_id)));
        }
        tables.last_choice_id += 1;
        let choice = Choice {
            id: tables.last_choice_id,
            question_id: choice.question_id,
            choice_text: choice.choice_text,
            votes: choice.votes,
        };
        tables.choices.insert(choice.id, choice.clone());
        Ok(choice)
    }

    async fn update_choice(&self, question_id: i32, id: i32, choice: ChoiceUpdate) -> Result<Option<Choice>, AppError> {
        check_text("choice_text", &choice.choice_text)?;
        check_votes(choice.votes)?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .choices
            .get_mut(&id)
            .filter(|stored| stored.question_id == question_id)
            .map(|stored| {
                stored.choice_text = choice.choice_text;
                stored.votes = choice.votes;
                stored.clone()
            }))
    }

    async fn delete_choice(&self, question_id: i32, id: i32) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let owned = tables.choices.get(&id).is_some_and(|c| c.question_id == question_id);
        if owned {
            tables.choices.remove(&id);
        }
        Ok(owned)
    }

    async fn choices_of(&self, question_id: i32) -> Result<Vec<Choice>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.choices.values().filter(|c| c.question_id == question_id).cloned().collect())
    }
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
