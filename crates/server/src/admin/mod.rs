//! Record-management console for questions and their choices.
//!
//! [`QUESTION_ADMIN`] describes how the console lays out questions; the views
//! in [`views`] read it instead of hard-coding fields.

pub mod auth;
pub mod filters;
pub mod forms;
pub mod views;

use crate::app::AppState;
use crate::routes;
use crate::store::Store;
use axum::{Router, middleware, routing::get};

#[derive(Debug, Clone, Copy)]
pub struct Fieldset {
    pub name: Option<&'static str>,
    pub fields: &'static [&'static str],
    pub classes: &'static [&'static str],
}

impl Fieldset {
    pub fn is_collapsed(&self) -> bool {
        self.classes.contains(&"collapse")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TabularInline {
    pub verbose_name_plural: &'static str,
    pub fields: &'static [&'static str],
    /// Blank rows offered below the existing ones.
    pub extra: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ModelAdmin {
    pub app_label: &'static str,
    pub verbose_name: &'static str,
    pub verbose_name_plural: &'static str,
    pub fieldsets: &'static [Fieldset],
    pub inline: TabularInline,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub search_fields: &'static [&'static str],
}

pub const QUESTION_ADMIN: ModelAdmin = ModelAdmin {
    app_label: "Polls",
    verbose_name: "question",
    verbose_name_plural: "Questions",
    fieldsets: &[
        Fieldset {
            name: None,
            fields: &["question_text"],
            classes: &[],
        },
        Fieldset {
            name: Some("Date information"),
            fields: &["pub_text"],
            classes: &["collapse"],
        },
    ],
    inline: TabularInline {
        verbose_name_plural: "Choices",
        fields: &["choice_text", "votes"],
        extra: 3,
    },
    list_display: &["question_text", "pub_text", "was_published_recently"],
    list_filter: &["pub_text"],
    search_fields: &["question_text"],
};

/// Column or form label for a question or choice field.
pub fn label(field: &str) -> &'static str {
    match field {
        "question_text" => "Question text",
        "pub_text" => "Date published",
        "was_published_recently" => "Published recently?",
        "choice_text" => "Choice text",
        "votes" => "Votes",
        _ => "",
    }
}

/// Stored column a `list_display` entry sorts by. The recency column has no
/// column of its own and sorts by publication date.
pub fn admin_order_field(field: &str) -> Option<&'static str> {
    match field {
        "question_text" => Some("question_text"),
        "pub_text" | "was_published_recently" => Some("pub_text"),
        _ => None,
    }
}

pub fn router<S: Store>(state: AppState<S>) -> Router<AppState<S>> {
    Router::new()
        .route(routes::ADMIN_INDEX, get(views::index::<S>))
        .route(routes::QUESTION_CHANGELIST, get(views::changelist::<S>))
        .route(routes::QUESTION_ADD, get(views::add_form::<S>).post(views::add_submit::<S>))
        .route(routes::QUESTION_CHANGE, get(views::change_form::<S>).post(views::change_submit::<S>))
        .route(routes::QUESTION_DELETE, get(views::delete_confirm::<S>).post(views::delete_submit::<S>))
        .route_layer(middleware::from_fn_with_state(state, auth::require_login::<S>))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_admin_layout() {
        let admin = QUESTION_ADMIN;
        assert_eq!(admin.fieldsets.len(), 2);
        assert!(admin.fieldsets[0].name.is_none() && !admin.fieldsets[0].is_collapsed());
        assert_eq!(admin.fieldsets[1].name, Some("Date information"));
        assert!(admin.fieldsets[1].is_collapsed());
        assert_eq!(admin.inline.extra, 3);
        assert_eq!(admin.list_display, ["question_text", "pub_text", "was_published_recently"]);
        assert_eq!(admin.list_filter, ["pub_text"]);
        assert_eq!(admin.search_fields, ["question_text"]);
    }

    #[test]
    fn every_configured_field_has_a_label() {
        let admin = QUESTION_ADMIN;
        let fields = admin
            .fieldsets
            .iter()
            .flat_map(|f| f.fields.iter())
            .chain(admin.inline.fields)
            .chain(admin.list_display);
        for field in fields {
            assert!(!label(field).is_empty(), "{field} has no label");
        }
    }

    #[test]
    fn every_list_column_is_sortable() {
        for field in QUESTION_ADMIN.list_display {
            assert!(admin_order_field(field).is_some(), "{field} cannot be sorted");
        }
        assert_eq!(admin_order_field("was_published_recently"), Some("pub_text"));
    }
}
