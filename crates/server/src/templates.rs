use crate::error::AppError;
use axum::response::Html;
use tera::{Context, Tera};

/// Builds the template set compiled into the binary. Names ending in
/// `.html` are autoescaped.
pub fn engine() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("polls/index.html", include_str!("../templates/polls/index.html")),
        ("polls/detail.html", include_str!("../templates/polls/detail.html")),
        ("admin/base.html", include_str!("../templates/admin/base.html")),
        ("admin/index.html", include_str!("../templates/admin/index.html")),
        ("admin/change_list.html", include_str!("../templates/admin/change_list.html")),
        ("admin/change_form.html", include_str!("../templates/admin/change_form.html")),
        ("admin/delete_confirmation.html", include_str!("../templates/admin/delete_confirmation.html")),
    ])?;
    Ok(tera)
}

pub fn render(tera: &Tera, name: &str, context: &Context) -> Result<Html<String>, AppError> {
    Ok(Html(tera.render(name, context)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_parse() {
        let tera = engine().unwrap();
        assert!(tera.get_template_names().any(|name| name == "admin/change_form.html"));
    }

    #[test]
    fn html_is_escaped() {
        let tera = engine().unwrap();
        let mut context = Context::new();
        context.insert("latest_question_list", &Vec::<crate::views::QuestionLink>::new());
        let page = tera.render("polls/index.html", &context).unwrap();
        assert!(page.contains("No polls are available."));

        let mut context = Context::new();
        context.insert("question", &serde_json::json!({"id": 1, "question_text": "<b>bold</b>"}));
        context.insert("choices", &Vec::<crate::models::Choice>::new());
        context.insert("index_url", crate::routes::INDEX);
        let page = tera.render("polls/detail.html", &context).unwrap();
        assert!(page.contains("&lt;b&gt;bold&lt;&#x2F;b&gt;"));
        assert!(page.contains(r#"<a href="/polls/">All polls</a>"#));
    }
}
