use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

pub const MAX_DESCRIPTION_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub student_id: i64,
    pub description: String,
    pub completed: bool,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTaskForm {
    pub description: Option<String>,
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditTaskForm {
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub student_id: i64,
    pub description: String,
    pub deadline: Option<NaiveDate>,
}

impl NewTaskForm {
    pub fn validate(self, student_id: i64) -> Result<NewTask, AppError> {
        let description = parse_description(self.description.as_deref())?;
        let deadline = parse_deadline(self.deadline.as_deref())?;
        Ok(NewTask {
            student_id,
            description,
            deadline,
        })
    }
}

impl EditTaskForm {
    pub fn validate(self) -> Result<String, AppError> {
        parse_description(self.description.as_deref())
    }
}

pub fn parse_description(raw: Option<&str>) -> Result<String, AppError> {
    let description = raw.unwrap_or_default().trim();
    if description.is_empty() {
        return Err(AppError::bad_request("Empty description"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::bad_request("Description too long"));
    }
    Ok(description.to_string())
}

/// Deadlines arrive as `YYYY-MM-DD`; blank means no deadline.
pub fn parse_deadline(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::bad_request("Invalid deadline")),
        None => Ok(None),
    }
}
