use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<String>,
    pub citizenship: Option<String>,
    pub intended_major: Option<String>,
    pub entry_semester: Option<String>,
    pub entry_year: Option<i64>,
    pub assigned_date: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Raw fields of the add-student form. Every field is optional here so that
/// a missing input is reported as a validation failure rather than a
/// deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStudentForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub citizenship: Option<String>,
    pub intended_major: Option<String>,
    pub entry_semester: Option<String>,
    pub entry_year: Option<String>,
    pub assigned_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<String>,
    pub citizenship: Option<String>,
    pub intended_major: Option<String>,
    pub entry_semester: Option<String>,
    pub entry_year: Option<i64>,
    pub assigned_date: String,
}

impl NewStudentForm {
    pub fn validate(self) -> Result<NewStudent, AppError> {
        let (Some(first_name), Some(last_name), Some(assigned_date)) = (
            non_blank(self.first_name),
            non_blank(self.last_name),
            non_blank(self.assigned_date),
        ) else {
            warn!("rejected student form: missing required fields");
            return Err(AppError::InvalidForm("Missing required fields".to_string()));
        };

        let entry_year = match non_blank(self.entry_year) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                warn!("rejected student form: bad entry_year {:?}", raw);
                AppError::InvalidForm("Invalid entry year".to_string())
            })?),
            None => None,
        };

        Ok(NewStudent {
            first_name,
            last_name,
            dob: non_blank(self.dob),
            citizenship: non_blank(self.citizenship),
            intended_major: non_blank(self.intended_major),
            entry_semester: non_blank(self.entry_semester),
            entry_year,
            assigned_date,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
