use super::{ChoiceCommon, QuestionCommon, QuestionOrder, QuestionQuery, Store, check_text, check_votes};
use crate::error::AppError;
use crate::models::{Choice, ChoiceInsert, ChoiceUpdate, Question, QuestionInsert};
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgPoolOptions};

#[derive(Debug, Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

/// Escapes LIKE wildcards so search terms match literally.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters(stmt: &mut QueryBuilder<'_, Postgres>, query: &QuestionQuery) {
    stmt.push(" WHERE 1 = 1");
    if let Some(t) = query.pub_text_lte {
        stmt.push(" AND pub_text <= ").push_bind(t);
    }
    if let Some(t) = query.pub_text_gte {
        stmt.push(" AND pub_text >= ").push_bind(t);
    }
    if let Some(t) = query.pub_text_lt {
        stmt.push(" AND pub_text < ").push_bind(t);
    }
    for term in &query.text_terms {
        stmt.push(" AND question_text ILIKE ").push_bind(like_pattern(term));
    }
}

impl QuestionCommon for PgStore {
    async fn insert_question(&self, question: QuestionInsert) -> Result<Question, AppError> {
        check_text("question_text", &question.question_text)?;
        let question = sqlx::query_as("INSERT INTO questions (question_text, pub_text) VALUES ($1, $2) RETURNING id, question_text, pub_text")
            .bind(question.question_text)
            .bind(question.pub_text)
            .fetch_one(&self.db)
            .await?;
        Ok(question)
    }

    async fn update_question(&self, id: i32, question: QuestionInsert) -> Result<Option<Question>, AppError> {
        check_text("question_text", &question.question_text)?;
        let question = sqlx::query_as(
            "UPDATE questions SET question_text = $1, pub_text = $2 WHERE id = $3 RETURNING id, question_text, pub_text",
        )
        .bind(question.question_text)
        .bind(question.pub_text)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(question)
    }

    async fn get_question(&self, id: i32) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as("SELECT id, question_text, pub_text FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(question)
    }

    async fn query_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, AppError> {
        let mut stmt = QueryBuilder::new("SELECT id, question_text, pub_text FROM questions");
        push_filters(&mut stmt, query);
        stmt.push(match query.order {
            QuestionOrder::IdDesc => " ORDER BY id DESC",
            QuestionOrder::PubTextAsc => " ORDER BY pub_text ASC, id DESC",
            QuestionOrder::PubTextDesc => " ORDER BY pub_text DESC, id DESC",
            QuestionOrder::QuestionTextAsc => " ORDER BY question_text ASC, id DESC",
            QuestionOrder::QuestionTextDesc => " ORDER BY question_text DESC, id DESC",
        });
        let questions = stmt.build_query_as().fetch_all(&self.db).await?;
        Ok(questions)
    }

    async fn question_text_exists(&self, question_text: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM questions WHERE question_text = $1)")
            .bind(question_text)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }

    async fn delete_question(&self, id: i32) -> Result<bool, AppError> {
        // choices go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}

impl ChoiceCommon for PgStore {
    async fn insert_choice(&self, choice: ChoiceInsert) -> Result<Choice, AppError> {
        check_text("choice_text", &choice.choice_text)?;
        check_votes(choice.votes)?;
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM questions WHERE id = $1)")
            .bind(choice.question_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::Constraint(format!("question {} does not exist", choice.question_id)));
        }
        let choice = sqlx::query_as(
            "INSERT INTO choices (question_id, choice_text, votes) VALUES ($1, $2, $3) RETURNING id, question_id, choice_text, votes",
        )
        .bind(choice.question_id)
        .bind(choice.choice_text)
        .bind(choice.votes)
        .fetch_one(&self.db)
        .await?;
        Ok(choice)
    }

    async fn update_choice(&self, question_id: i32, id: i32, choice: ChoiceUpdate) -> Result<Option<Choice>, AppError> {
        check_text("choice_text", &choice.choice_text)?;
        check_votes(choice.votes)?;
        let choice = sqlx::query_as(
            "UPDATE choices SET choice_text = $1, votes = $2
             WHERE id = $3 AND question_id = $4
             RETURNING id, question_id, choice_text, votes",
        )
        .bind(choice.choice_text)
        .bind(choice.votes)
        .bind(id)
        .bind(question_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(choice)
    }

    async fn delete_choice(&self, question_id: i32, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM choices WHERE id = $1 AND question_id = $2")
            .bind(id)
            .bind(question_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn choices_of(&self, question_id: i32) -> Result<Vec<Choice>, AppError> {
        let choices = sqlx::query_as("SELECT id, question_id, choice_text, votes FROM choices WHERE question_id = $1 ORDER BY id")
            .bind(question_id)
            .fetch_all(&self.db)
            .await?;
        Ok(choices)
    }
}

impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("plain"), "%plain%");
    }
}
