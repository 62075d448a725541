// Prompt templates for the LLM extraction backend.

pub const RESUME_EXTRACT_SYSTEM: &str = "\
You are a precise resume data extractor. \
Copy values exactly as they appear in the resume; never invent a field that is not there. \
Use an empty string or empty list when a value is absent.";

pub const RESUME_EXTRACT_PROMPT: &str = r#"Carefully extract structured resume information from the text below.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "Name": "Full Name",
  "Mobile": "Contact number as written" | ["every contact number"],
  "Email": "Email address",
  "Graduation": {"Degree": "Highest degree", "Institution": "Institution name"},
  "Skills": ["skill"],
  "Education": ["one line per qualification, most recent first as written"],
  "Work Experiences": [
    {"Company": "Company name", "Role": "Role or position", "Duration": "Duration of employment as written, e.g. Jan 2020 - Present"}
  ]
}

List every work experience, in the order the resume lists them."#;
