use super::filters::DateFilter;
use super::forms::{ChoiceChange, CleanedQuestion, FormErrors, INLINE_PREFIX, QuestionForm};
use super::{ModelAdmin, QUESTION_ADMIN, admin_order_field, label};
use crate::app::AppState;
use crate::error::AppError;
use crate::models::{ChoiceInsert, Question};
use crate::routes;
use crate::store::{ChoiceCommon, QuestionCommon, QuestionOrder, QuestionQuery, Store};
use crate::templates::render;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tera::Context;

const DATE_DISPLAY: &str = "%b %-d, %Y, %H:%M";

#[derive(Debug, Default, Deserialize)]
pub struct ChangeListParams {
    pub q: Option<String>,
    pub pub_text: Option<String>,
    /// Sorted column, 1-based into `list_display`; a leading `-` sorts descending.
    pub o: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SortColumn {
    index: usize,
    descending: bool,
}

impl SortColumn {
    fn parse(admin: &ModelAdmin, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let index: usize = digits.parse().ok()?;
        let field = admin.list_display.get(index.checked_sub(1)?)?;
        admin_order_field(field)?;
        Some(Self { index, descending })
    }

    fn param(self) -> String {
        if self.descending {
            format!("-{}", self.index)
        } else {
            self.index.to_string()
        }
    }

    fn order(self, admin: &ModelAdmin) -> QuestionOrder {
        admin
            .list_display
            .get(self.index - 1)
            .and_then(|field| admin_order_field(field))
            .and_then(|column| QuestionOrder::by(column, self.descending))
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct HeaderView {
    label: &'static str,
    /// Empty for columns that cannot be sorted.
    href: String,
    /// `ascending`, `descending` or empty.
    sorted: &'static str,
}

#[derive(Debug, Serialize)]
struct Cell {
    text: String,
    /// Empty unless the cell links to the change form.
    link: String,
    is_boolean: bool,
    boolean: bool,
}

#[derive(Debug, Serialize)]
struct FilterLink {
    label: &'static str,
    href: String,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct FieldView {
    name: &'static str,
    label: &'static str,
    value: String,
    date_value: String,
    time_value: String,
    is_datetime: bool,
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FieldsetView {
    name: &'static str,
    collapsed: bool,
    /// A collapsed fieldset opens when one of its fields failed validation.
    has_errors: bool,
    fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
struct InlineRowView {
    prefix: String,
    id: String,
    choice_text: String,
    votes: String,
    delete: bool,
    is_existing: bool,
    errors: Vec<String>,
}

fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

fn base_context(admin: &ModelAdmin) -> Context {
    let mut context = Context::new();
    context.insert("app_label", admin.app_label);
    context.insert("verbose_name", admin.verbose_name);
    context.insert("verbose_name_plural", admin.verbose_name_plural);
    context.insert("changelist_url", routes::QUESTION_CHANGELIST);
    context.insert("add_url", routes::QUESTION_ADD);
    context.insert("admin_index_url", routes::ADMIN_INDEX);
    context
}

pub async fn index<S: Store>(State(state): State<AppState<S>>) -> Result<Html<String>, AppError> {
    render(&state.templates, "admin/index.html", &base_context(&QUESTION_ADMIN))
}

fn list_cell(field: &str, question: &Question, now: DateTime<Utc>) -> Cell {
    match field {
        "pub_text" => Cell {
            text: question.pub_text.format(DATE_DISPLAY).to_string(),
            link: String::new(),
            is_boolean: false,
            boolean: false,
        },
        "was_published_recently" => {
            let recent = question.was_published_recently_at(now);
            Cell {
                text: if recent { "True" } else { "False" }.into(),
                link: String::new(),
                is_boolean: true,
                boolean: recent,
            }
        }
        _ => Cell {
            text: question.question_text.clone(),
            link: String::new(),
            is_boolean: false,
            boolean: false,
        },
    }
}

fn changelist_href(search: &str, filter: DateFilter, sort: Option<SortColumn>) -> String {
    let sort = sort.map(SortColumn::param);
    let mut params: Vec<(&str, &str)> = Vec::new();
    if !search.is_empty() {
        params.push(("q", search));
    }
    if let Some(value) = filter.param() {
        params.push(("pub_text", value));
    }
    if let Some(value) = sort.as_deref() {
        params.push(("o", value));
    }
    match serde_urlencoded::to_string(&params) {
        Ok(query) if !query.is_empty() => format!("?{query}"),
        _ => "?".into(),
    }
}

pub async fn changelist<S: Store>(State(state): State<AppState<S>>, Query(params): Query<ChangeListParams>) -> Result<Html<String>, AppError> {
    let admin = QUESTION_ADMIN;
    let now = Utc::now();
    let search = params.q.as_deref().unwrap_or("").trim().to_string();
    let filter = DateFilter::from_param(params.pub_text.as_deref());
    let sort = params.o.as_deref().and_then(|raw| SortColumn::parse(&admin, raw));

    let mut query = QuestionQuery {
        text_terms: search.split_whitespace().map(str::to_string).collect(),
        order: sort.map(|s| s.order(&admin)).unwrap_or_default(),
        ..Default::default()
    };
    filter.apply(&mut query, now);
    let questions = state.store.query_questions(&query).await?;
    let total = if query.text_terms.is_empty() && filter == DateFilter::AnyDate {
        questions.len()
    } else {
        state.store.query_questions(&QuestionQuery::default()).await?.len()
    };
    tracing::debug!(results = questions.len(), total, "question changelist");

    let rows: Vec<Vec<Cell>> = questions
        .iter()
        .map(|question| {
            admin
                .list_display
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let mut cell = list_cell(field, question, now);
                    if i == 0 {
                        cell.link = routes::question_change(question.id);
                    }
                    cell
                })
                .collect()
        })
        .collect();
    let headers: Vec<HeaderView> = admin
        .list_display
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let index = i + 1;
            let current = sort.filter(|s| s.index == index);
            let href = match admin_order_field(field) {
                Some(_) => {
                    // First click sorts ascending, the next one flips it.
                    let descending = current.is_some_and(|s| !s.descending);
                    changelist_href(&search, filter, Some(SortColumn { index, descending }))
                }
                None => String::new(),
            };
            HeaderView {
                label: label(field),
                href,
                sorted: match current {
                    Some(s) if s.descending => "descending",
                    Some(_) => "ascending",
                    None => "",
                },
            }
        })
        .collect();
    let filters: Vec<FilterLink> = DateFilter::ALL
        .into_iter()
        .map(|f| FilterLink {
            label: f.label(),
            href: changelist_href(&search, f, sort),
            selected: f == filter,
        })
        .collect();

    let mut context = base_context(&admin);
    context.insert("headers", &headers);
    context.insert("rows", &rows);
    context.insert("result_count", &questions.len());
    context.insert("total_count", &total);
    context.insert("is_filtered", &(!query.text_terms.is_empty() || filter != DateFilter::AnyDate));
    context.insert("search", &search);
    context.insert("has_search", &!admin.search_fields.is_empty());
    context.insert("filter_title", label(admin.list_filter.first().copied().unwrap_or("pub_text")));
    context.insert("filters", &filters);
    render(&state.templates, "admin/change_list.html", &context)
}

fn form_context(admin: &ModelAdmin, form: &QuestionForm, errors: &FormErrors, question: Option<&Question>) -> Context {
    let fieldsets: Vec<FieldsetView> = admin
        .fieldsets
        .iter()
        .map(|fieldset| FieldsetView {
            name: fieldset.name.unwrap_or_default(),
            collapsed: fieldset.is_collapsed(),
            has_errors: fieldset.fields.iter().any(|&name| match name {
                "pub_text" => !errors.pub_text.is_empty(),
                _ => !errors.question_text.is_empty(),
            }),
            fields: fieldset
                .fields
                .iter()
                .map(|&name| match name {
                    "pub_text" => FieldView {
                        name,
                        label: label(name),
                        value: String::new(),
                        date_value: form.pub_date.clone(),
                        time_value: form.pub_time.clone(),
                        is_datetime: true,
                        errors: errors.pub_text.clone(),
                    },
                    _ => FieldView {
                        name,
                        label: label(name),
                        value: form.question_text.clone(),
                        date_value: String::new(),
                        time_value: String::new(),
                        is_datetime: false,
                        errors: errors.question_text.clone(),
                    },
                })
                .collect(),
        })
        .collect();
    let rows: Vec<InlineRowView> = form
        .choices
        .iter()
        .enumerate()
        .map(|(i, row)| InlineRowView {
            prefix: format!("{INLINE_PREFIX}-{i}"),
            id: row.id.clone(),
            choice_text: row.choice_text.clone(),
            votes: row.votes.clone(),
            delete: row.delete,
            is_existing: row.is_existing(),
            errors: errors.choices.get(&i).cloned().unwrap_or_default(),
        })
        .collect();
    let inline_headers: Vec<&str> = admin.inline.fields.iter().map(|f| label(f)).collect();

    let mut context = base_context(admin);
    context.insert("fieldsets", &fieldsets);
    context.insert("inline_title", admin.inline.verbose_name_plural);
    context.insert("inline_headers", &inline_headers);
    context.insert("inline_rows", &rows);
    context.insert("error_count", &errors.count());
    match question {
        Some(question) => {
            context.insert("title", &format!("Change {}", admin.verbose_name));
            context.insert("object_repr", &question.to_string());
            context.insert("form_url", &routes::question_change(question.id));
            context.insert("delete_url", &routes::question_delete(question.id));
        }
        None => {
            context.insert("title", &format!("Add {}", admin.verbose_name));
            context.insert("object_repr", "");
            context.insert("form_url", routes::QUESTION_ADD);
            context.insert("delete_url", "");
        }
    }
    context
}

pub async fn add_form<S: Store>(State(state): State<AppState<S>>) -> Result<Html<String>, AppError> {
    let form = QuestionForm::empty(QUESTION_ADMIN.inline.extra);
    let context = form_context(&QUESTION_ADMIN, &form, &FormErrors::default(), None);
    render(&state.templates, "admin/change_form.html", &context)
}

pub async fn change_form<S: Store>(State(state): State<AppState<S>>, Path(question_id): Path<String>) -> Result<Html<String>, AppError> {
    let id = parse_id(&question_id)?;
    let question = state.store.get_question(id).await?.ok_or(AppError::NotFound)?;
    let choices = state.store.choices_of(id).await?;
    let form = QuestionForm::from_records(&question, &choices, QUESTION_ADMIN.inline.extra);
    let context = form_context(&QUESTION_ADMIN, &form, &FormErrors::default(), Some(&question));
    render(&state.templates, "admin/change_form.html", &context)
}

async fn save<S: Store>(store: &S, existing: Option<i32>, cleaned: CleanedQuestion) -> Result<Question, AppError> {
    let question = match existing {
        Some(id) => store.update_question(id, cleaned.question).await?.ok_or(AppError::NotFound)?,
        None => store.insert_question(cleaned.question).await?,
    };
    for change in cleaned.choices {
        match change {
            ChoiceChange::Create { choice_text, votes } => {
                store
                    .insert_choice(ChoiceInsert {
                        question_id: question.id,
                        choice_text,
                        votes,
                    })
                    .await?;
            }
            ChoiceChange::Update { id, choice } => {
                if store.update_choice(question.id, id, choice).await?.is_none() {
                    tracing::warn!(question = question.id, choice = id, "skipped update of missing choice");
                }
            }
            ChoiceChange::Delete { id } => {
                store.delete_choice(question.id, id).await?;
            }
        }
    }
    Ok(question)
}

fn redirect_after_save(pairs: &[(String, String)], question: &Question) -> Redirect {
    if pairs.iter().any(|(k, _)| k == "_continue") {
        Redirect::to(&routes::question_change(question.id))
    } else if pairs.iter().any(|(k, _)| k == "_addanother") {
        Redirect::to(routes::QUESTION_ADD)
    } else {
        Redirect::to(routes::QUESTION_CHANGELIST)
    }
}

async fn submit<S: Store>(state: &AppState<S>, existing: Option<Question>, pairs: Vec<(String, String)>) -> Result<Response, AppError> {
    let form = QuestionForm::from_pairs(pairs.clone());
    match form.validate() {
        Ok(cleaned) => {
            let question = save(&state.store, existing.map(|q| q.id), cleaned).await?;
            tracing::info!(question = question.id, "saved question");
            Ok(redirect_after_save(&pairs, &question).into_response())
        }
        Err(errors) => {
            let context = form_context(&QUESTION_ADMIN, &form, &errors, existing.as_ref());
            Ok(render(&state.templates, "admin/change_form.html", &context)?.into_response())
        }
    }
}

pub async fn add_submit<S: Store>(State(state): State<AppState<S>>, Form(pairs): Form<Vec<(String, String)>>) -> Result<Response, AppError> {
    submit(&state, None, pairs).await
}

pub async fn change_submit<S: Store>(
    State(state): State<AppState<S>>,
    Path(question_id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let id = parse_id(&question_id)?;
    let question = state.store.get_question(id).await?.ok_or(AppError::NotFound)?;
    submit(&state, Some(question), pairs).await
}

pub async fn delete_confirm<S: Store>(State(state): State<AppState<S>>, Path(question_id): Path<String>) -> Result<Html<String>, AppError> {
    let id = parse_id(&question_id)?;
    let question = state.store.get_question(id).await?.ok_or(AppError::NotFound)?;
    let choices = state.store.choices_of(id).await?;
    let choice_texts: Vec<String> = choices.iter().map(ToString::to_string).collect();

    let mut context = base_context(&QUESTION_ADMIN);
    context.insert("object_repr", &question.to_string());
    context.insert("change_url", &routes::question_change(id));
    context.insert("delete_url", &routes::question_delete(id));
    context.insert("related_title", QUESTION_ADMIN.inline.verbose_name_plural);
    context.insert("related", &choice_texts);
    render(&state.templates, "admin/delete_confirmation.html", &context)
}

pub async fn delete_submit<S: Store>(State(state): State<AppState<S>>, Path(question_id): Path<String>) -> Result<Redirect, AppError> {
    let id = parse_id(&question_id)?;
    if !state.store.delete_question(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(question = id, "deleted question and its choices");
    Ok(Redirect::to(routes::QUESTION_CHANGELIST))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn filter_links_keep_the_search() {
        assert_eq!(changelist_href("lunch plans", DateFilter::Today, None), "?q=lunch+plans&pub_text=today");
        assert_eq!(changelist_href("", DateFilter::AnyDate, None), "?");
        let sort = SortColumn { index: 2, descending: true };
        assert_eq!(changelist_href("", DateFilter::ThisYear, Some(sort)), "?pub_text=this_year&o=-2");
    }

    #[test]
    fn sort_parameter_maps_columns_to_orders() {
        let admin = QUESTION_ADMIN;
        let parse = |raw| SortColumn::parse(&admin, raw);
        assert_eq!(parse("1").map(|s| s.order(&admin)), Some(QuestionOrder::QuestionTextAsc));
        assert_eq!(parse("-2").map(|s| s.order(&admin)), Some(QuestionOrder::PubTextDesc));
        assert_eq!(parse("3").map(|s| s.order(&admin)), Some(QuestionOrder::PubTextAsc));
        assert_eq!(parse("-3").map(|s| s.param()), Some("-3".to_string()));
        for bad in ["0", "4", "-", "x", ""] {
            assert!(parse(bad).is_none(), "{bad:?} should not sort");
        }
    }

    #[test]
    fn collapsed_fieldset_opens_on_date_errors() {
        let form = QuestionForm::from_pairs(vec![
            ("question_text".into(), "Ok".into()),
            ("pub_text_0".into(), "not-a-date".into()),
            ("pub_text_1".into(), "10:00".into()),
        ]);
        let errors = form.validate().unwrap_err();
        let context = form_context(&QUESTION_ADMIN, &form, &errors, None).into_json();
        let fieldsets = &context["fieldsets"];
        assert_eq!(fieldsets[0]["has_errors"], false);
        assert_eq!(fieldsets[1]["collapsed"], true);
        assert_eq!(fieldsets[1]["has_errors"], true);
    }

    #[test]
    fn recency_column_is_boolean() {
        let now = Utc::now();
        let question = Question {
            id: 1,
            question_text: "Fresh?".into(),
            pub_text: now - Duration::hours(2),
        };
        let cell = list_cell("was_published_recently", &question, now);
        assert!(cell.is_boolean && cell.boolean);
        let cell = list_cell("question_text", &question, now);
        assert_eq!(cell.text, "Fresh?");
    }
}
