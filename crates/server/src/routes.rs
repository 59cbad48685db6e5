//! Named routes, so pages and tests never hand-build paths.

pub const INDEX: &str = "/polls/";
pub const HEALTH: &str = "/health";
pub const ADMIN_INDEX: &str = "/admin/";
pub const QUESTION_CHANGELIST: &str = "/admin/polls/question/";
pub const QUESTION_ADD: &str = "/admin/polls/question/add/";

/// Router patterns; `details`, `question_change` and `question_delete` fill them in.
pub const DETAILS: &str = "/polls/:question_id/";
pub const QUESTION_CHANGE: &str = "/admin/polls/question/:question_id/change/";
pub const QUESTION_DELETE: &str = "/admin/polls/question/:question_id/delete/";

fn fill(pattern: &str, question_id: i32) -> String {
    pattern.replace(":question_id", &question_id.to_string())
}

pub fn details(question_id: i32) -> String {
    fill(DETAILS, question_id)
}

pub fn question_change(question_id: i32) -> String {
    fill(QUESTION_CHANGE, question_id)
}

pub fn question_delete(question_id: i32) -> String {
    fill(QUESTION_DELETE, question_id)
}
