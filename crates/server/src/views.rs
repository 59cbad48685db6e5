use crate::app::AppState;
use crate::error::AppError;
use crate::models::{Choice, Question};
use crate::routes;
use crate::store::{ChoiceCommon, QuestionCommon, QuestionQuery, Store};
use crate::templates::render;
use axum::{
    Json,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::Context;

#[derive(Debug, Serialize)]
pub struct QuestionLink {
    pub question_text: String,
    pub url: String,
}

impl From<&Question> for QuestionLink {
    fn from(question: &Question) -> Self {
        Self {
            question_text: question.question_text.clone(),
            url: routes::details(question.id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    pub question: Question,
    pub choices: Vec<Choice>,
}

/// Every question already published at `now`, newest first.
pub async fn latest_questions<S: Store>(store: &S, now: DateTime<Utc>) -> Result<Vec<Question>, AppError> {
    store.query_questions(&QuestionQuery::published_before(now)).await
}

/// Looks a question up for visitors. Unknown and not-yet-published ids are
/// indistinguishable to the caller.
pub async fn question_detail<S: Store>(store: &S, id: i32, now: DateTime<Utc>) -> Result<QuestionDetail, AppError> {
    let question = store
        .get_question(id)
        .await?
        .filter(|q| q.is_published_at(now))
        .ok_or(AppError::NotFound)?;
    let choices = store.choices_of(question.id).await?;
    Ok(QuestionDetail { question, choices })
}

pub async fn root() -> Redirect {
    Redirect::permanent(routes::INDEX)
}

pub async fn index<S: Store>(State(state): State<AppState<S>>) -> Result<Html<String>, AppError> {
    let questions = latest_questions(&state.store, Utc::now()).await?;
    let links: Vec<QuestionLink> = questions.iter().map(QuestionLink::from).collect();
    let mut context = Context::new();
    context.insert("latest_question_list", &links);
    render(&state.templates, "polls/index.html", &context)
}

pub async fn details<S: Store>(State(state): State<AppState<S>>, Path(question_id): Path<String>) -> Result<Html<String>, AppError> {
    let id: i32 = question_id.parse().map_err(|_| AppError::NotFound)?;
    let detail = question_detail(&state.store, id, Utc::now()).await?;
    let mut context = Context::new();
    context.insert("question", &detail.question);
    context.insert("choices", &detail.choices);
    context.insert("index_url", routes::INDEX);
    render(&state.templates, "polls/detail.html", &context)
}

pub async fn health<S: Store>(State(state): State<AppState<S>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => Json(serde_json::json!({
            "status": "ok",
            "database": "connected"
        })),
        Err(err) => {
            tracing::warn!("health check failed: {}", err);
            Json(serde_json::json!({
                "status": "error",
                "database": "disconnected"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChoiceInsert, QuestionInsert};
    use crate::store::MemoryStore;
    use chrono::Duration;

    async fn create_question(store: &MemoryStore, question_text: &str, days: i64) -> Question {
        store
            .insert_question(QuestionInsert {
                question_text: question_text.into(),
                pub_text: Utc::now() + Duration::days(days),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn no_questions_gives_empty_list() {
        let store = MemoryStore::new();
        assert!(latest_questions(&store, Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn past_question_is_listed() {
        let store = MemoryStore::new();
        let past = create_question(&store, "Past Question.", -30).await;
        assert_eq!(latest_questions(&store, Utc::now()).await.unwrap(), vec![past]);
    }

    #[tokio::test]
    async fn future_question_is_not_listed() {
        let store = MemoryStore::new();
        create_question(&store, "Future Question.", 30).await;
        assert!(latest_questions(&store, Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_past_questions_are_listed() {
        let store = MemoryStore::new();
        let past = create_question(&store, "Past Question.", -30).await;
        create_question(&store, "Future Question.", 30).await;
        assert_eq!(latest_questions(&store, Utc::now()).await.unwrap(), vec![past]);
    }

    #[tokio::test]
    async fn two_past_questions_newest_first() {
        let store = MemoryStore::new();
        let question1 = create_question(&store, "Past Question 1.", -30).await;
        let question2 = create_question(&store, "Past Question 2.", -5).await;
        assert_eq!(latest_questions(&store, Utc::now()).await.unwrap(), vec![question2, question1]);
    }

    #[tokio::test]
    async fn future_question_detail_is_not_found() {
        let store = MemoryStore::new();
        let future = create_question(&store, "Future Question.", 5).await;
        let err = question_detail(&store, future.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn missing_question_detail_is_not_found() {
        let store = MemoryStore::new();
        let err = question_detail(&store, 99, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn past_question_detail_carries_its_choices() {
        let store = MemoryStore::new();
        let past = create_question(&store, "Past Question.", -5).await;
        for text in ["Yes", "No"] {
            store
                .insert_choice(ChoiceInsert {
                    question_id: past.id,
                    choice_text: text.into(),
                    votes: 0,
                })
                .await
                .unwrap();
        }
        let detail = question_detail(&store, past.id, Utc::now()).await.unwrap();
        assert_eq!(detail.question, past);
        let texts: Vec<_> = detail.choices.iter().map(|c| c.choice_text.as_str()).collect();
        assert_eq!(texts, ["Yes", "No"]);
    }
}
