//! Question change form with its tabular choice inline.
//!
//! Field names follow the split date/time widget (`pub_text_0`, `pub_text_1`)
//! and the inline prefix `choice_set-<n>-<field>`.

use crate::models::{Choice, ChoiceUpdate, MAX_TEXT_LENGTH, Question, QuestionInsert};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;

pub const INLINE_PREFIX: &str = "choice_set";

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceRow {
    pub id: String,
    pub choice_text: String,
    pub votes: String,
    pub delete: bool,
}

impl ChoiceRow {
    pub fn blank() -> Self {
        Self {
            votes: "0".into(),
            ..Default::default()
        }
    }

    pub fn is_existing(&self) -> bool {
        !self.id.trim().is_empty()
    }

    fn is_untouched(&self) -> bool {
        let votes = self.votes.trim();
        self.choice_text.trim().is_empty() && (votes.is_empty() || votes == "0")
    }
}

impl From<&Choice> for ChoiceRow {
    fn from(choice: &Choice) -> Self {
        Self {
            id: choice.id.to_string(),
            choice_text: choice.choice_text.clone(),
            votes: choice.votes.to_string(),
            delete: false,
        }
    }
}

/// Raw submitted (or initial) values, kept as strings so invalid input can be
/// shown back to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionForm {
    pub question_text: String,
    pub pub_date: String,
    pub pub_time: String,
    pub choices: Vec<ChoiceRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceChange {
    Create { choice_text: String, votes: i32 },
    Update { id: i32, choice: ChoiceUpdate },
    Delete { id: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedQuestion {
    pub question: QuestionInsert,
    pub choices: Vec<ChoiceChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub question_text: Vec<String>,
    pub pub_text: Vec<String>,
    /// Keyed by position in [`QuestionForm::choices`].
    pub choices: BTreeMap<usize, Vec<String>>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.question_text.is_empty() && self.pub_text.is_empty() && self.choices.is_empty()
    }

    pub fn count(&self) -> usize {
        self.question_text.len() + self.pub_text.len() + self.choices.values().map(Vec::len).sum::<usize>()
    }
}

impl QuestionForm {
    /// Blank add form.
    pub fn empty(extra: usize) -> Self {
        Self {
            choices: vec![ChoiceRow::blank(); extra],
            ..Default::default()
        }
    }

    /// Change form pre-filled from stored records.
    pub fn from_records(question: &Question, choices: &[Choice], extra: usize) -> Self {
        let mut rows: Vec<ChoiceRow> = choices.iter().map(ChoiceRow::from).collect();
        rows.extend(std::iter::repeat_n(ChoiceRow::blank(), extra));
        Self {
            question_text: question.question_text.clone(),
            pub_date: question.pub_text.format("%Y-%m-%d").to_string(),
            pub_time: question.pub_text.format("%H:%M:%S").to_string(),
            choices: rows,
        }
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        let mut rows: BTreeMap<usize, ChoiceRow> = BTreeMap::new();
        for (key, value) in pairs {
            match key.as_str() {
                "question_text" => form.question_text = value,
                "pub_text_0" => form.pub_date = value,
                "pub_text_1" => form.pub_time = value,
                _ => {
                    let Some((index, field)) = inline_field(&key) else { continue };
                    let row = rows.entry(index).or_default();
                    match field {
                        "id" => row.id = value,
                        "choice_text" => row.choice_text = value,
                        "votes" => row.votes = value,
                        "DELETE" => row.delete = matches!(value.as_str(), "on" | "true" | "1"),
                        _ => {}
                    }
                }
            }
        }
        form.choices = rows.into_values().collect();
        form
    }

    pub fn validate(&self) -> Result<CleanedQuestion, FormErrors> {
        let mut errors = FormErrors::default();

        let question_text = self.question_text.trim();
        if question_text.is_empty() {
            errors.question_text.push(REQUIRED.into());
        } else if let Some(msg) = too_long(question_text) {
            errors.question_text.push(msg);
        }

        let pub_text = match parse_pub_text(&self.pub_date, &self.pub_time) {
            Ok(t) => Some(t),
            Err(msgs) => {
                errors.pub_text = msgs;
                None
            }
        };

        let mut changes = Vec::new();
        for (index, row) in self.choices.iter().enumerate() {
            match clean_row(row) {
                Ok(Some(change)) => changes.push(change),
                Ok(None) => {}
                Err(msgs) => {
                    errors.choices.insert(index, msgs);
                }
            }
        }

        match pub_text {
            Some(pub_text) if errors.is_empty() => Ok(CleanedQuestion {
                question: QuestionInsert {
                    question_text: question_text.to_string(),
                    pub_text,
                },
                choices: changes,
            }),
            _ => Err(errors),
        }
    }
}

fn inline_field(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix(INLINE_PREFIX)?.strip_prefix('-')?;
    let (index, field) = rest.split_once('-')?;
    Some((index.parse().ok()?, field))
}

fn too_long(value: &str) -> Option<String> {
    let len = value.chars().count();
    (len > MAX_TEXT_LENGTH).then(|| format!("Ensure this value has at most {MAX_TEXT_LENGTH} characters (it has {len})."))
}

fn parse_pub_text(date: &str, time: &str) -> Result<DateTime<Utc>, Vec<String>> {
    let (date, time) = (date.trim(), time.trim());
    if date.is_empty() && time.is_empty() {
        return Err(vec![REQUIRED.into()]);
    }
    let mut errors = Vec::new();
    let date = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            errors.push("Enter a valid date.".to_string());
            None
        }
    };
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|_| errors.push("Enter a valid time.".to_string()))
        .ok();
    match (date, time) {
        (Some(date), Some(time)) => Ok(Utc.from_utc_datetime(&date.and_time(time))),
        _ => Err(errors),
    }
}

fn clean_row(row: &ChoiceRow) -> Result<Option<ChoiceChange>, Vec<String>> {
    let id = if row.is_existing() {
        Some(row.id.trim().parse::<i32>().map_err(|_| vec!["Select a valid choice.".to_string()])?)
    } else {
        None
    };
    match id {
        Some(id) if row.delete => return Ok(Some(ChoiceChange::Delete { id })),
        None if row.delete || row.is_untouched() => return Ok(None),
        _ => {}
    }

    let mut errors = Vec::new();
    let choice_text = row.choice_text.trim();
    if choice_text.is_empty() {
        errors.push(REQUIRED.to_string());
    } else if let Some(msg) = too_long(choice_text) {
        errors.push(msg);
    }
    let votes = row.votes.trim();
    let votes = if votes.is_empty() {
        Some(0)
    } else {
        match votes.parse::<i32>() {
            Ok(v) if v < 0 => {
                errors.push("Ensure this value is greater than or equal to 0.".to_string());
                None
            }
            Ok(v) => Some(v),
            Err(_) => {
                errors.push("Enter a whole number.".to_string());
                None
            }
        }
    };
    if !errors.is_empty() {
        return Err(errors);
    }
    let choice_text = choice_text.to_string();
    let votes = votes.unwrap_or_default();
    Ok(Some(match id {
        Some(id) => ChoiceChange::Update {
            id,
            choice: ChoiceUpdate { choice_text, votes },
        },
        None => ChoiceChange::Create { choice_text, votes },
    }))
}
