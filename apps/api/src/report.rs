//! Review views over resume records: the flat table, grouped table and
//! summary statistics shown before and after saving.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::models::resume::ResumeRecord;

const TOP_COMPANIES: usize = 5;

/// One (record, experience) pair. A record without experience still yields
/// one row with empty company and role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub graduation: String,
    pub company: String,
    pub role: String,
    pub calculated_duration: i64,
    pub total_experience: i64,
}

pub fn flatten(records: &[ResumeRecord]) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    for r in records {
        let base = FlatRow {
            name: r.name.clone(),
            mobile: r.mobile.clone(),
            email: r.email.clone(),
            graduation: r.graduation.clone(),
            company: String::new(),
            role: String::new(),
            calculated_duration: 0,
            total_experience: r.total_experience,
        };
        if r.experience.is_empty() {
            rows.push(base);
            continue;
        }
        for e in &r.experience {
            rows.push(FlatRow {
                company: e.company.clone(),
                role: e.role.clone(),
                calculated_duration: e.calculated_duration,
                ..base.clone()
            });
        }
    }
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Name,
    Mobile,
    Email,
    Graduation,
    Company,
    Role,
}

pub const DEFAULT_GROUP_KEYS: &[GroupKey] =
    &[GroupKey::Name, GroupKey::Mobile, GroupKey::Graduation];

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Name => "name",
            GroupKey::Mobile => "mobile",
            GroupKey::Email => "email",
            GroupKey::Graduation => "graduation",
            GroupKey::Company => "company",
            GroupKey::Role => "role",
        }
    }

    fn value<'a>(&self, row: &'a FlatRow) -> &'a str {
        match self {
            GroupKey::Name => &row.name,
            GroupKey::Mobile => &row.mobile,
            GroupKey::Email => &row.email,
            GroupKey::Graduation => &row.graduation,
            GroupKey::Company => &row.company,
            GroupKey::Role => &row.role,
        }
    }
}

impl std::str::FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(GroupKey::Name),
            "mobile" => Ok(GroupKey::Mobile),
            "email" => Ok(GroupKey::Email),
            "graduation" => Ok(GroupKey::Graduation),
            "company" => Ok(GroupKey::Company),
            "role" => Ok(GroupKey::Role),
            other => Err(format!(
                "cannot group by '{other}'; expected name, mobile, email, graduation, company or role"
            )),
        }
    }
}

/// Parses a comma-separated key list. Empty input selects the defaults;
/// repeated keys are ignored.
pub fn parse_group_keys(list: Option<&str>) -> Result<Vec<GroupKey>, String> {
    let Some(list) = list.filter(|s| !s.trim().is_empty()) else {
        return Ok(DEFAULT_GROUP_KEYS.to_vec());
    };
    let mut keys = Vec::new();
    for part in list.split(',').filter(|p| !p.trim().is_empty()) {
        let key: GroupKey = part.parse()?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    Ok(keys)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow {
    pub key: BTreeMap<&'static str, String>,
    /// First company seen in the group.
    pub company: String,
    /// First role seen in the group.
    pub role: String,
    /// Sum over the group.
    pub calculated_duration: i64,
    /// First total seen in the group.
    pub total_experience: i64,
    /// First email seen in the group.
    pub email: String,
}

/// Groups rows by `keys`, emitting groups in first-seen order.
pub fn group_rows(rows: &[FlatRow], keys: &[GroupKey]) -> Vec<GroupedRow> {
    let mut index: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut groups: Vec<GroupedRow> = Vec::new();

    for row in rows {
        let key_values: Vec<&str> = keys.iter().map(|k| k.value(row)).collect();
        match index.get(&key_values) {
            Some(&i) => groups[i].calculated_duration += row.calculated_duration,
            None => {
                index.insert(key_values.clone(), groups.len());
                groups.push(GroupedRow {
                    key: keys
                        .iter()
                        .zip(key_values)
                        .map(|(k, v)| (k.as_str(), v.to_string()))
                        .collect(),
                    company: row.company.clone(),
                    role: row.role.clone(),
                    calculated_duration: row.calculated_duration,
                    total_experience: row.total_experience,
                    email: row.email.clone(),
                });
            }
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperienceBucket {
    /// Total experience in months.
    pub total_experience: i64,
    pub candidates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_candidates: usize,
    pub experience_distribution: Vec<ExperienceBucket>,
    pub top_companies: Vec<ValueCount>,
    pub graduation_distribution: Vec<ValueCount>,
}

/// Summary over flat rows. Candidate-level figures count each mobile once;
/// company counts are per row.
pub fn summarize(rows: &[FlatRow]) -> SummaryStats {
    let total_candidates = rows
        .iter()
        .map(|r| r.name.trim())
        .filter(|n| !n.is_empty())
        .collect::<HashSet<_>>()
        .len();

    let mut seen = HashSet::new();
    let candidates: Vec<&FlatRow> = rows.iter().filter(|r| seen.insert(&r.mobile)).collect();

    let mut experience: BTreeMap<i64, usize> = BTreeMap::new();
    for c in &candidates {
        *experience.entry(c.total_experience).or_default() += 1;
    }

    let mut top_companies = count_values(rows.iter().map(|r| r.company.as_str()));
    top_companies.truncate(TOP_COMPANIES);

    SummaryStats {
        total_candidates,
        experience_distribution: experience
            .into_iter()
            .map(|(total_experience, candidates)| ExperienceBucket {
                total_experience,
                candidates,
            })
            .collect(),
        top_companies,
        graduation_distribution: count_values(candidates.iter().map(|c| c.graduation.as_str())),
    }
}

/// Counts non-empty values, most frequent first, ties alphabetical.
fn count_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values.map(str::trim).filter(|v| !v.is_empty()) {
        *counts.entry(v).or_default() += 1;
    }
    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}
