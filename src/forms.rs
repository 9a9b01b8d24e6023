//! Form cleaning for write requests
//!
//! Forms arrive as `application/x-www-form-urlencoded` strings and are turned
//! into typed values here. Every rejection is attached to the offending field so
//! the client can show it next to the input.

use std::borrow::Cow;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{LoanStatus, NewAuthor, NewBook, NewBookInstance};

/// Latest renewal date accepted, in weeks from today
pub const RENEWAL_MAX_AHEAD_WEEKS: i64 = 4;

/// Renewal date offered when the form is first shown, in weeks from today
pub const RENEWAL_SUGGESTED_WEEKS: i64 = 3;

pub const RENEWAL_HELP_TEXT: &str = "Enter a date between now and 4 weeks (default 3).";

const DATE_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn required() -> ValidationError {
    field_error("required", "This field is required.")
}

pub(crate) fn invalid_choice() -> ValidationError {
    field_error("invalid_choice", "Select a valid choice.")
}

fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| field_error("invalid_date", "Enter a valid date."))
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

fn parse_required_date(value: &str) -> Result<NaiveDate, ValidationError> {
    match value.trim() {
        "" => Err(required()),
        value => parse_date(value),
    }
}

fn parse_choice(value: Option<&str>) -> Result<i32, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Err(required()),
        Some(value) => value.parse().map_err(|_| invalid_choice()),
    }
}

fn require_text(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, required());
    }
}

/// Checks that `date` lies within the loan window starting `today`.
///
/// `what` names the date in the messages, e.g. "renewal".
pub fn check_loan_window(
    date: NaiveDate,
    today: NaiveDate,
    what: &str,
) -> Result<NaiveDate, ValidationError> {
    if date < today {
        return Err(field_error("in_past", format!("Invalid date - {} in past", what)));
    }
    if date > today + Duration::weeks(RENEWAL_MAX_AHEAD_WEEKS) {
        return Err(field_error(
            "too_far_ahead",
            format!("Invalid date - {} more than 4 weeks ahead", what),
        ));
    }
    Ok(date)
}

/// Accepts a renewal date between today and four weeks ahead, both inclusive.
pub fn clean_renewal_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    check_loan_window(date, today, "renewal")
}

pub fn suggested_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(RENEWAL_SUGGESTED_WEEKS)
}

fn single_field(
    field: &'static str,
    result: Result<NaiveDate, ValidationError>,
) -> Result<NaiveDate, ValidationErrors> {
    result.map_err(|error| {
        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        errors
    })
}

/// Librarian form to extend a loan
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RenewBookForm {
    /// Date in `YYYY-MM-DD` form
    #[serde(default)]
    pub renewal_date: String,
}

impl RenewBookForm {
    pub fn clean(&self, today: NaiveDate) -> Result<NaiveDate, ValidationErrors> {
        single_field(
            "renewal_date",
            parse_required_date(&self.renewal_date).and_then(|d| clean_renewal_date(d, today)),
        )
    }
}

/// Create/update form for authors
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct AuthorForm {
    #[serde(default)]
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    /// "Died"
    #[serde(default)]
    pub date_of_death: Option<String>,
}

impl AuthorForm {
    pub fn clean(&self) -> Result<NewAuthor, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        require_text(&mut errors, "first_name", &self.first_name);
        require_text(&mut errors, "last_name", &self.last_name);

        let date_of_birth = parse_optional_date(self.date_of_birth.as_deref())
            .map_err(|e| errors.add("date_of_birth", e))
            .ok()
            .flatten();
        let date_of_death = parse_optional_date(self.date_of_death.as_deref())
            .map_err(|e| errors.add("date_of_death", e))
            .ok()
            .flatten();

        if let (Some(born), Some(died)) = (date_of_birth, date_of_death) {
            if died < born {
                errors.add(
                    "date_of_death",
                    field_error("before_birth", "Date of death cannot precede date of birth."),
                );
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewAuthor {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth,
            date_of_death,
        })
    }
}

/// Create/update form for books
///
/// `genre` may be repeated, one key per selected genre.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[serde(default)]
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Ensure this value has at most 1000 characters."))]
    pub summary: String,
    /// 13 character ISBN number
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl BookForm {
    /// Cleans the form fields. Referenced rows are checked by the caller.
    pub fn clean(&self) -> Result<NewBook, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        require_text(&mut errors, "title", &self.title);
        require_text(&mut errors, "summary", &self.summary);

        let isbn = self.isbn.trim();
        if isbn.is_empty() {
            errors.add("isbn", required());
        } else if isbn.chars().count() != 13 {
            errors.add("isbn", field_error("isbn_length", "ISBN must have exactly 13 characters."));
        }

        let author_id = parse_choice(self.author.as_deref()).map_err(|e| errors.add("author", e)).ok();
        let language_id = parse_choice(self.language.as_deref())
            .map_err(|e| errors.add("language", e))
            .ok();

        let mut genre_ids = Vec::with_capacity(self.genre.len());
        for value in &self.genre {
            match parse_choice(Some(value.as_str())) {
                Ok(id) if !genre_ids.contains(&id) => genre_ids.push(id),
                Ok(_) => (),
                Err(_) => {
                    errors.add("genre", invalid_choice());
                    break;
                }
            }
        }
        if self.genre.is_empty() {
            errors.add("genre", required());
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewBook {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            isbn: isbn.to_string(),
            author_id,
            language_id,
            genre_ids,
        })
    }
}

/// Form to register a new copy of a book
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct BookInstanceForm {
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    pub imprint: String,
    /// Status code: `m`, `a` or `r`; empty leaves it unset
    #[serde(default)]
    pub status: Option<String>,
}

impl BookInstanceForm {
    pub fn clean(&self) -> Result<NewBookInstance, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        require_text(&mut errors, "imprint", &self.imprint);

        let book_id = parse_choice(self.book.as_deref()).map_err(|e| errors.add("book", e)).ok();

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => match code.parse::<LoanStatus>() {
                Ok(LoanStatus::OnLoan) => {
                    errors.add(
                        "status",
                        field_error("on_loan", "New copies are put on loan through the lend form."),
                    );
                    None
                }
                Ok(status) => Some(status),
                Err(_) => {
                    errors.add("status", invalid_choice());
                    None
                }
            },
        };

        match book_id {
            Some(book_id) if errors.is_empty() => Ok(NewBookInstance {
                book_id,
                imprint: self.imprint.trim().to_string(),
                status,
            }),
            _ => Err(errors),
        }
    }
}

/// Form to lend an available copy to a user
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LendForm {
    /// User id of the borrower
    #[serde(default)]
    pub borrower: Option<String>,
    #[serde(default)]
    pub due_back: String,
}

/// Cleaned lend form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lend {
    pub borrower_id: i32,
    pub due_back: NaiveDate,
}

impl LendForm {
    pub fn clean(&self, today: NaiveDate) -> Result<Lend, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let borrower_id = parse_choice(self.borrower.as_deref())
            .map_err(|e| errors.add("borrower", e))
            .ok();
        let due_back = parse_required_date(&self.due_back)
            .and_then(|d| check_loan_window(d, today, "due back"))
            .map_err(|e| errors.add("due_back", e))
            .ok();

        match (borrower_id, due_back) {
            (Some(borrower_id), Some(due_back)) => Ok(Lend { borrower_id, due_back }),
            _ => Err(errors),
        }
    }
}
