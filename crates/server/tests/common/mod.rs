#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use polls::admin::auth::basic_auth_header;
use polls::config::AdminCredentials;
use polls::models::{Choice, ChoiceInsert, Question, QuestionInsert};
use polls::store::{ChoiceCommon, MemoryStore, QuestionCommon};
use polls::{AppState, router};
use tower::ServiceExt;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse";

pub struct Response {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

pub fn app(store: &MemoryStore) -> Router {
    let admin = AdminCredentials {
        username: ADMIN_USER.into(),
        password: ADMIN_PASSWORD.into(),
    };
    router(AppState::new(store.clone(), Some(admin)).unwrap())
}

/// Question published `days` from now; negative is the past.
pub async fn create_question(store: &MemoryStore, question_text: &str, days: i64) -> Question {
    store
        .insert_question(QuestionInsert {
            question_text: question_text.into(),
            pub_text: Utc::now() + Duration::days(days),
        })
        .await
        .unwrap()
}

pub async fn create_choice(store: &MemoryStore, question: &Question, choice_text: &str) -> Choice {
    store
        .insert_choice(ChoiceInsert {
            question_id: question.id,
            choice_text: choice_text.into(),
            votes: 0,
        })
        .await
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> Response {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    Response {
        status,
        location,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn admin_get(app: Router, uri: &str) -> Response {
    let request = Request::get(uri)
        .header(header::AUTHORIZATION, basic_auth_header(ADMIN_USER, ADMIN_PASSWORD))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn admin_post(app: Router, uri: &str, form: &[(&str, &str)]) -> Response {
    let body = serde_urlencoded::to_string(form).unwrap();
    let request = Request::post(uri)
        .header(header::AUTHORIZATION, basic_auth_header(ADMIN_USER, ADMIN_PASSWORD))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}
