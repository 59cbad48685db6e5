use crate::admin;
use crate::config::AdminCredentials;
use crate::routes;
use crate::store::Store;
use crate::views;
use axum::{Router, routing::get};
use std::sync::Arc;
use tera::Tera;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState<S: Store> {
    pub store: S,
    pub templates: Arc<Tera>,
    pub admin: Option<Arc<AdminCredentials>>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, admin: Option<AdminCredentials>) -> Result<Self, tera::Error> {
        Ok(Self {
            store,
            templates: Arc::new(crate::templates::engine()?),
            admin: admin.map(Arc::new),
        })
    }
}

pub fn router<S: Store>(state: AppState<S>) -> Router {
    let mut app = Router::new()
        .route("/", get(views::root))
        .route(routes::HEALTH, get(views::health::<S>))
        .route(routes::INDEX, get(views::index::<S>))
        .route(routes::DETAILS, get(views::details::<S>));
    if state.admin.is_some() {
        app = app.merge(admin::router(state.clone()));
    } else {
        tracing::warn!("ADMIN_USERNAME / ADMIN_PASSWORD not set, admin console disabled");
    }
    app.layer(TraceLayer::new_for_http()).with_state(state)
}
