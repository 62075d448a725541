//! Heuristic field extraction over normalized resume text.
//!
//! # Approach
//! 1. Contact details (email, phone) are matched anywhere in the text.
//! 2. Heading lines split the text into sections. A heading is a short line
//!    whose words match a known section title, optionally with a trailing
//!    colon; `Skills: Rust, Go` opens the section and keeps its content.
//! 3. Each section has its own line parser. Experience entries are anchored
//!    on date ranges; the text around a range names the company and role.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::duration::RANGE_RE;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExperience {
    pub company: String,
    pub role: String,
    pub duration: String,
}

/// Fields as found in the text, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub name: String,
    /// Phone-like candidates in document order, as written.
    pub mobiles: Vec<String>,
    pub email: String,
    pub graduation: String,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<RawExperience>,
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\(?\d[\d \t().-]{7,}\d").unwrap());

static NAME_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*(?:full\s+)?name\s*[:\-]\s*(.+?)\s*$").unwrap());

static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s•·▪●○◦■□➢►✓*\-–]+").unwrap());

static SKILL_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,|;•·]").unwrap());

static ENTRY_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+at\s+|\s+@\s+|\s*[|,]\s*|\s+[-–—]\s+").unwrap());

static DEGREE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:[bm]\.?\s?tech|[bm]\.?\s?sc|[bm]\.?\s?com|[bm]\.\s?[eas]\b|[bm]\.?\s?arch|bca|mca|mba|bba|ph\.?\s?d|bachelor|master|diploma|doctorate|associate degree|engineering degree)",
    )
    .unwrap()
});

const SKILLS_HEADINGS: &[&str] = &[
    "skills",
    "technical skills",
    "key skills",
    "core skills",
    "core competencies",
    "competencies",
    "technologies",
    "technical expertise",
    "skill set",
    "skillset",
    "it skills",
    "tools and technologies",
    "tools technologies",
    "areas of expertise",
    "expertise",
];

const EDUCATION_HEADINGS: &[&str] = &[
    "education",
    "educational qualification",
    "educational qualifications",
    "academic qualification",
    "academic qualifications",
    "academic background",
    "academic details",
    "academics",
    "qualification",
    "qualifications",
    "education and training",
    "educational background",
];

const EXPERIENCE_HEADINGS: &[&str] = &[
    "experience",
    "work experience",
    "professional experience",
    "relevant experience",
    "experience summary",
    "employment",
    "employment history",
    "work history",
    "career history",
    "professional background",
    "internship",
    "internships",
];

const OTHER_HEADINGS: &[&str] = &[
    "summary",
    "professional summary",
    "profile",
    "profile summary",
    "objective",
    "career objective",
    "about me",
    "projects",
    "academic projects",
    "personal projects",
    "certifications",
    "certificates",
    "awards",
    "achievements",
    "accomplishments",
    "languages",
    "interests",
    "hobbies",
    "publications",
    "references",
    "personal details",
    "personal information",
    "declaration",
    "activities",
    "extracurricular activities",
    "volunteering",
    "contact",
    "training",
];

/// Document titles that sit where a name usually is.
const TITLE_WORDS: &[&str] = &["resume", "curriculum vitae", "cv", "biodata", "bio data"];

const ROLE_KEYWORDS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "analyst",
    "intern",
    "consultant",
    "lead",
    "designer",
    "architect",
    "scientist",
    "director",
    "specialist",
    "associate",
    "officer",
    "administrator",
    "executive",
    "head",
    "coordinator",
    "tester",
    "programmer",
    "trainee",
    "founder",
    "president",
    "assistant",
    "technician",
    "accountant",
    "representative",
    "sde",
    "qa",
];

const COMPANY_MARKERS: &[&str] = &[
    "ltd",
    "limited",
    "inc",
    "corp",
    "corporation",
    "llc",
    "llp",
    "pvt",
    "private",
    "gmbh",
    "technologies",
    "solutions",
    "systems",
    "labs",
    "services",
    "software",
    "company",
    "group",
    "bank",
    "university",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Skills,
    Education,
    Experience,
    Other,
}

#[derive(Debug, Default)]
struct Sections<'a> {
    header: Vec<&'a str>,
    skills: Vec<&'a str>,
    education: Vec<&'a str>,
    experience: Vec<&'a str>,
    other: Vec<&'a str>,
    has_experience_heading: bool,
}

/// Extracts resume fields from normalized text.
pub fn extract_fields(text: &str) -> ExtractedFields {
    let sections = split_sections(text);

    let experience = if sections.has_experience_heading {
        parse_experience(&sections.experience)
    } else {
        let mut lines = sections.header.clone();
        lines.extend(sections.other.iter());
        parse_experience(&lines)
    };

    let education: Vec<String> = sections
        .education
        .iter()
        .map(|l| strip_bullet(l).to_string())
        .filter(|l| !l.is_empty())
        .collect();

    ExtractedFields {
        name: find_name(text, &sections.header),
        mobiles: find_mobiles(text),
        email: EMAIL_RE
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        graduation: pick_graduation(&education),
        skills: parse_skills(&sections.skills),
        education,
        experience,
    }
}

fn split_sections(text: &str) -> Sections<'_> {
    let mut sections = Sections::default();
    let mut current = Section::Header;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (section, inline) = match classify_heading(line) {
            Some(found) => found,
            None => {
                push_line(&mut sections, current, line);
                continue;
            }
        };
        current = section;
        if section == Section::Experience {
            sections.has_experience_heading = true;
        }
        if let Some(content) = inline {
            push_line(&mut sections, current, content);
        }
    }
    sections
}

fn push_line<'a>(sections: &mut Sections<'a>, section: Section, line: &'a str) {
    match section {
        Section::Header => sections.header.push(line),
        Section::Skills => sections.skills.push(line),
        Section::Education => sections.education.push(line),
        Section::Experience => sections.experience.push(line),
        Section::Other => sections.other.push(line),
    }
}

/// Recognises `Heading`, `HEADING:` and `Heading: inline content`. The inline
/// form only applies to the three parsed sections, so `Languages: Rust` inside
/// a skills block stays a skills line.
fn classify_heading(line: &str) -> Option<(Section, Option<&str>)> {
    if let Some((label, rest)) = line.split_once(':') {
        let rest = rest.trim();
        if !rest.is_empty() {
            return match section_for(label) {
                Some(s @ (Section::Skills | Section::Education | Section::Experience)) => {
                    Some((s, Some(rest)))
                }
                _ => None,
            };
        }
        return section_for(label).map(|s| (s, None));
    }
    section_for(line).map(|s| (s, None))
}

fn section_for(label: &str) -> Option<Section> {
    let key = heading_key(label)?;
    let key = key.as_str();
    if SKILLS_HEADINGS.contains(&key) {
        Some(Section::Skills)
    } else if EDUCATION_HEADINGS.contains(&key) {
        Some(Section::Education)
    } else if EXPERIENCE_HEADINGS.contains(&key) {
        Some(Section::Experience)
    } else if OTHER_HEADINGS.contains(&key) {
        Some(Section::Other)
    } else {
        None
    }
}

/// Lowercased heading words with punctuation dropped; `None` for lines too
/// long to be a heading.
fn heading_key(label: &str) -> Option<String> {
    let words: Vec<String> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() || words.len() > 5 {
        return None;
    }
    Some(words.join(" "))
}

fn strip_bullet(line: &str) -> &str {
    match BULLET_RE.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line.trim(),
    }
}

fn is_bullet(line: &str) -> bool {
    BULLET_RE
        .find(line)
        .is_some_and(|m| !line[..m.end()].trim().is_empty())
}

fn find_mobiles(text: &str) -> Vec<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (10..=15).contains(&digits) && !is_whole_date_range(candidate)
        })
        .map(str::to_string)
        .collect()
}

/// `2019-03 - 2021-05` has phone-like digit counts.
fn is_whole_date_range(candidate: &str) -> bool {
    RANGE_RE
        .find(candidate)
        .is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
}

fn find_name(text: &str, header: &[&str]) -> String {
    if let Some(cap) = NAME_LABEL_RE.captures(text) {
        return cap[1].to_string();
    }
    header
        .iter()
        .take(6)
        .filter_map(|line| line.split('|').next().map(str::trim))
        .find(|candidate| is_name_like(candidate))
        .map(str::to_string)
        .unwrap_or_default()
}

fn is_name_like(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    if candidate.len() > 40
        || candidate.contains('@')
        || candidate.chars().any(|c| c.is_ascii_digit())
        || lower.contains("http")
        || lower.contains("www")
        || lower.contains("linkedin")
        || TITLE_WORDS.contains(&lower.as_str())
        || section_for(candidate).is_some()
    {
        return false;
    }
    let words: Vec<&str> = candidate.split_whitespace().collect();
    (2..=4).contains(&words.len())
        && words.iter().all(|w| {
            w.chars().any(char::is_alphabetic)
                && w.chars().all(|c| c.is_alphabetic() || matches!(c, '.' | '\'' | '-'))
        })
}

fn parse_skills(lines: &[&str]) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for line in lines {
        let line = strip_bullet(line);
        let content = match line.split_once(':') {
            Some((_, rest)) => rest,
            None => line,
        };
        for token in SKILL_SPLIT_RE.split(content) {
            let token = strip_bullet(token).trim_end_matches('.').trim();
            if token.is_empty() || token.len() > 40 || token.split_whitespace().count() > 4 {
                continue;
            }
            if !skills.iter().any(|s| s.eq_ignore_ascii_case(token)) {
                skills.push(token.to_string());
            }
        }
    }
    skills
}

fn pick_graduation(education: &[String]) -> String {
    education
        .iter()
        .find(|line| DEGREE_RE.is_match(line))
        .or_else(|| education.first())
        .cloned()
        .unwrap_or_default()
}

/// Walks the experience block. A line with a date range closes an entry;
/// short non-bullet lines before it are header candidates for that entry.
fn parse_experience(lines: &[&str]) -> Vec<RawExperience> {
    let mut entries = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for raw in lines {
        let bullet = is_bullet(raw);
        let line = strip_bullet(raw);

        if let Some(range) = RANGE_RE.find(line) {
            let rest = format!("{} {}", &line[..range.start()], &line[range.end()..]);
            let rest = trim_separators(&rest);
            let mut parts: Vec<String> = std::mem::take(&mut pending);
            if !rest.is_empty() {
                parts.push(rest.to_string());
            }
            let (company, role) = split_company_role(&parts);
            entries.push(RawExperience {
                company,
                role,
                duration: range.as_str().to_string(),
            });
        } else if !bullet && line.split_whitespace().count() <= 8 && !line.ends_with('.') {
            pending.push(line.to_string());
            if pending.len() > 2 {
                pending.remove(0);
            }
        } else {
            pending.clear();
        }
    }
    entries
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || "|,-–—:()@".contains(c))
}

fn has_word(segment: &str, words: &[&str]) -> bool {
    segment
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| words.contains(&w.to_lowercase().as_str()))
}

/// Picks company and role out of header fragments. A fragment with a role
/// keyword is the role; a fragment with a company marker is the company;
/// with no signal the first fragment is the company.
fn split_company_role(parts: &[String]) -> (String, String) {
    let segments: Vec<&str> = parts
        .iter()
        .flat_map(|p| ENTRY_SPLIT_RE.split(p))
        .map(trim_separators)
        .filter(|s| !s.is_empty())
        .collect();

    let role_idx = segments
        .iter()
        .position(|s| has_word(s, ROLE_KEYWORDS) && !has_word(s, COMPANY_MARKERS))
        .or_else(|| segments.iter().position(|s| has_word(s, ROLE_KEYWORDS)));

    let company_idx = segments
        .iter()
        .enumerate()
        .position(|(i, s)| Some(i) != role_idx && has_word(s, COMPANY_MARKERS))
        .or_else(|| (0..segments.len()).find(|i| Some(*i) != role_idx));

    let role_idx =
        role_idx.or_else(|| (0..segments.len()).find(|i| Some(*i) != company_idx));

    let pick = |idx: Option<usize>| idx.map(|i| segments[i].to_string()).unwrap_or_default();
    (pick(company_idx), pick(role_idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SAMPLE_RESUME;

    #[test]
    fn test_sample_contact_fields() {
        let fields = extract_fields(SAMPLE_RESUME);
        assert_eq!(fields.name, "Asha Rao");
        assert_eq!(fields.email, "asha.rao@example.com");
        assert_eq!(fields.mobiles, vec!["+91 98765-43210".to_string()]);
    }

    #[test]
    fn test_sample_skills_are_deduplicated_case_insensitively() {
        let fields = extract_fields(SAMPLE_RESUME);
        assert_eq!(
            fields.skills,
            vec!["Rust", "Python", "SQL", "Docker", "Kubernetes", "PostgreSQL"]
        );
    }

    #[test]
    fn test_sample_education_and_graduation() {
        let fields = extract_fields(SAMPLE_RESUME);
        assert_eq!(
            fields.education,
            vec![
                "B.Tech in Computer Science - IIT Madras, 2016",
                "Class XII - Kendriya Vidyalaya"
            ]
        );
        assert_eq!(fields.graduation, "B.Tech in Computer Science - IIT Madras, 2016");
    }

    #[test]
    fn test_sample_experience_entries_in_order() {
        let fields = extract_fields(SAMPLE_RESUME);
        assert_eq!(
            fields.experience,
            vec![
                RawExperience {
                    company: "Acme Corp".to_string(),
                    role: "Senior Software Engineer".to_string(),
                    duration: "Jan 2020 - Present".to_string(),
                },
                RawExperience {
                    company: "Globex Ltd".to_string(),
                    role: "Data Analyst".to_string(),
                    duration: "Mar 2017 – Dec 2019".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_name_label_wins_over_first_line() {
        let text = "CURRICULUM VITAE\nName: Ravi Kumar Singh\nMobile: 98450 12345";
        assert_eq!(extract_fields(text).name, "Ravi Kumar Singh");
    }

    #[test]
    fn test_title_line_is_not_a_name() {
        let text = "Curriculum Vitae\nMeera Nair\nmeera@example.org";
        assert_eq!(extract_fields(text).name, "Meera Nair");
    }

    #[test]
    fn test_date_ranges_are_not_phone_numbers() {
        let text = "Jo Smith\nExperience\nEngineer, Initech, 2019-03 - 2021-05";
        assert!(extract_fields(text).mobiles.is_empty());
    }

    #[test]
    fn test_short_numbers_are_not_phone_numbers() {
        let text = "Jo Smith\nPin 560 001\nCall 080-2345-6789";
        assert_eq!(extract_fields(text).mobiles, vec!["080-2345-6789".to_string()]);
    }

    #[test]
    fn test_inline_skills_heading_keeps_content() {
        let text = "Jo Smith\nSkills: Go, Terraform; AWS";
        assert_eq!(extract_fields(text).skills, vec!["Go", "Terraform", "AWS"]);
    }

    #[test]
    fn test_role_at_company_format() {
        let text = "Jo Smith\nExperience\nBackend Developer at Initech (June 2015 to Present)";
        let exp = &extract_fields(text).experience;
        assert_eq!(exp.len(), 1);
        assert_eq!(exp[0].company, "Initech");
        assert_eq!(exp[0].role, "Backend Developer");
        assert_eq!(exp[0].duration, "June 2015 to Present");
    }

    #[test]
    fn test_experience_without_heading_is_found_in_body() {
        let text = "Jo Smith\nProduct Manager | Hooli Inc | 2018 - 2020";
        let exp = &extract_fields(text).experience;
        assert_eq!(exp.len(), 1);
        assert_eq!(exp[0].company, "Hooli Inc");
        assert_eq!(exp[0].role, "Product Manager");
    }

    #[test]
    fn test_heading_key_limits_length() {
        assert_eq!(heading_key("WORK EXPERIENCE"), Some("work experience".to_string()));
        assert_eq!(heading_key("Tools & Technologies"), Some("tools technologies".to_string()));
        assert_eq!(heading_key("one two three four five six"), None);
    }

    #[test]
    fn test_split_company_role_without_keywords() {
        let (company, role) = split_company_role(&["Initrode".to_string(), "Ninja".to_string()]);
        assert_eq!(company, "Initrode");
        assert_eq!(role, "Ninja");
    }

    #[test]
    fn test_empty_text_yields_empty_fields() {
        assert_eq!(extract_fields(""), ExtractedFields::default());
    }
}
