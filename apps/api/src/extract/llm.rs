//! LLM-backed field extraction. The model sees the locally extracted text and
//! answers in a fixed JSON shape; the shape is tolerant of the variations
//! models produce (a list of numbers, a plain-string graduation, nulls).

use async_trait::async_trait;
use serde::Deserialize;

use crate::extract::prompts::{RESUME_EXTRACT_PROMPT, RESUME_EXTRACT_SYSTEM};
use crate::extract::{ExtractError, ExtractedFields, FieldExtractor, RawExperience};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;

/// Upper bound on resume text sent to the model, in characters.
const MAX_PROMPT_CHARS: usize = 24_000;

pub struct LlmFieldExtractor(pub LlmClient);

/// Fills the extraction template, cutting the text at `MAX_PROMPT_CHARS`
/// characters (never mid code point).
fn build_prompt(text: &str) -> String {
    let text: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    RESUME_EXTRACT_PROMPT.replace("{resume_text}", &text)
}

fn system_prompt() -> String {
    format!("{RESUME_EXTRACT_SYSTEM} {JSON_ONLY_SYSTEM}")
}

#[async_trait]
impl FieldExtractor for LlmFieldExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedFields, ExtractError> {
        let parsed: LlmResume = self
            .0
            .call_json(&build_prompt(text), &system_prompt())
            .await
            .map_err(|e| ExtractError::Llm(e.to_string()))?;
        Ok(parsed.into_fields())
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LlmGraduation {
    Text(String),
    Detailed {
        #[serde(rename = "Degree", default)]
        degree: Option<String>,
        #[serde(rename = "Institution", default)]
        institution: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct LlmExperience {
    #[serde(rename = "Company", default)]
    company: Option<String>,
    #[serde(rename = "Role", default)]
    role: Option<String>,
    #[serde(rename = "Duration", default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LlmResume {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Mobile", default)]
    mobile: Option<OneOrMany>,
    #[serde(rename = "Email", default)]
    email: Option<String>,
    #[serde(rename = "Graduation", default)]
    graduation: Option<LlmGraduation>,
    #[serde(rename = "Skills", default)]
    skills: Option<Vec<String>>,
    #[serde(rename = "Education", default)]
    education: Option<Vec<String>>,
    #[serde(rename = "Work Experiences", default)]
    work_experiences: Option<Vec<LlmExperience>>,
}

impl LlmResume {
    fn into_fields(self) -> ExtractedFields {
        let graduation = match self.graduation {
            Some(LlmGraduation::Text(s)) => s.trim().to_string(),
            Some(LlmGraduation::Detailed {
                degree,
                institution,
            }) => format!(
                "{} - {}",
                degree.unwrap_or_default().trim(),
                institution.unwrap_or_default().trim()
            )
            .trim_matches(|c: char| c == ' ' || c == '-')
            .to_string(),
            None => String::new(),
        };

        let mobiles = match self.mobile {
            Some(OneOrMany::One(m)) => vec![m],
            Some(OneOrMany::Many(list)) => list,
            None => Vec::new(),
        };

        let mut education = self.education.unwrap_or_default();
        if education.is_empty() && !graduation.is_empty() {
            education.push(graduation.clone());
        }

        ExtractedFields {
            name: self.name.unwrap_or_default(),
            mobiles,
            email: self.email.unwrap_or_default(),
            graduation,
            skills: self.skills.unwrap_or_default(),
            education,
            experience: self
                .work_experiences
                .unwrap_or_default()
                .into_iter()
                .map(|e| RawExperience {
                    company: e.company.unwrap_or_default(),
                    role: e.role.unwrap_or_default(),
                    duration: e.duration.unwrap_or_default(),
                })
                .collect(),
        }
    }
}
