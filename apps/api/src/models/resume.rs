use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// One position held by a candidate, in the order it appears on the resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    pub role: String,
    /// Duration text exactly as written, e.g. "Jan 2020 - Present".
    pub duration: String,
    /// Whole months covered by `duration`.
    #[serde(default)]
    pub calculated_duration: i64,
}

/// The structured output of parsing one uploaded document.
///
/// `mobile` holds digits only and is the record key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub graduation: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub experience: Vec<WorkExperience>,
    /// Sum of `calculated_duration` over `experience`, in months.
    #[serde(default)]
    pub total_experience: i64,
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub created_at: Option<NaiveDate>,
}

impl ResumeRecord {
    pub fn recompute_total(&mut self) {
        self.total_experience = self
            .experience
            .iter()
            .map(|e| e.calculated_duration)
            .sum();
    }
}

/// Editable fields of a stored record. Mobile and creation date never change.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeUpdate {
    pub name: String,
    pub email: String,
    pub graduation: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub experience: Vec<WorkExperience>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub mobile: String,
    pub name: String,
    pub email: String,
    pub graduation: String,
    pub skills: Json<Vec<String>>,
    pub education: Json<Vec<String>>,
    pub total_experience: i64,
    pub source_file: String,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkExperienceRow {
    pub mobile: String,
    pub company: String,
    pub role: String,
    pub duration: String,
    pub calculated_duration: i64,
}

impl ResumeRow {
    pub fn into_record(self, experience: Vec<WorkExperience>) -> ResumeRecord {
        ResumeRecord {
            name: self.name,
            mobile: self.mobile,
            email: self.email,
            graduation: self.graduation,
            skills: self.skills.0,
            education: self.education.0,
            experience,
            total_experience: self.total_experience,
            source_file: self.source_file,
            created_at: Some(self.created_at),
        }
    }
}

impl From<WorkExperienceRow> for WorkExperience {
    fn from(row: WorkExperienceRow) -> Self {
        WorkExperience {
            company: row.company,
            role: row.role,
            duration: row.duration,
            calculated_duration: row.calculated_duration,
        }
    }
}
