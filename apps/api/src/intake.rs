//! Upload intake: one uploaded file (or zip of files) in, reviewable resume
//! records out. Nothing is persisted here; saving is a separate step after
//! the reviewer has seen the preview.

use bytes::Bytes;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::duration::calculate_duration;
use crate::extract::{
    expand_upload, extract_text, DocumentKind, ExtractError, ExtractedFields, FieldExtractor,
    UploadedDocument,
};
use crate::models::resume::{ResumeRecord, ResumeUpdate, WorkExperience};
use crate::report::{flatten, summarize, SummaryStats};

/// A document that produced no record, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileError {
    pub file_name: String,
    pub error_type: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct IntakePreview {
    pub batch_id: Uuid,
    pub extractor: &'static str,
    pub documents: usize,
    pub records: Vec<ResumeRecord>,
    pub errors: Vec<FileError>,
    pub summary: SummaryStats,
}

/// Runs the whole extraction pipeline over one upload.
///
/// A corrupt zip, or one expanding past `limit` bytes, fails the request.
/// Any single document failing is recorded in `errors` and the rest of the
/// batch carries on.
pub async fn process_upload(
    extractor: &dyn FieldExtractor,
    file_name: &str,
    bytes: Bytes,
    limit: usize,
    today: NaiveDate,
) -> Result<IntakePreview, AppError> {
    let batch_id = Uuid::new_v4();
    let upload_name = file_name.to_string();
    let documents = tokio::task::spawn_blocking(move || expand_upload(&upload_name, bytes, limit))
        .await
        .map_err(|e| ExtractError::Panicked(e.to_string()))??;
    let document_count = documents.len();

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for doc in documents {
        let name = doc.file_name.clone();
        match process_document(extractor, doc, today).await {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Batch {batch_id}: {name} skipped: {e}");
                errors.push(FileError {
                    file_name: name,
                    error_type: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    let records = merge_by_mobile(records);
    info!(
        "Batch {batch_id}: {} of {document_count} documents produced {} records via {} extractor",
        document_count - errors.len(),
        records.len(),
        extractor.name()
    );

    let summary = summarize(&flatten(&records));
    Ok(IntakePreview {
        batch_id,
        extractor: extractor.name(),
        documents: document_count,
        records,
        errors,
        summary,
    })
}

async fn process_document(
    extractor: &dyn FieldExtractor,
    doc: UploadedDocument,
    today: NaiveDate,
) -> Result<ResumeRecord, ExtractError> {
    let kind = DocumentKind::from_file_name(&doc.file_name)?;
    let file_name = doc.file_name.clone();

    // pdf-extract can panic on malformed input; a JoinError keeps that
    // contained to this document.
    let text = tokio::task::spawn_blocking(move || extract_text(kind, &doc.bytes))
        .await
        .map_err(|e| ExtractError::Panicked(e.to_string()))??;

    let fields = extractor.extract(&text).await?;
    build_record(fields, file_name, today)
}

/// Keeps ASCII digits only: `+91 (98765) 43-210` becomes `919876543210`.
pub fn normalize_mobile(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Turns raw fields into a record: trims text, picks the first usable
/// mobile, computes durations and the total.
pub fn build_record(
    fields: ExtractedFields,
    source_file: String,
    today: NaiveDate,
) -> Result<ResumeRecord, ExtractError> {
    let mobile = fields
        .mobiles
        .iter()
        .map(|m| normalize_mobile(m))
        .find(|m| !m.is_empty())
        .ok_or(ExtractError::MissingMobile)?;

    let experience = fields
        .experience
        .into_iter()
        .map(|e| WorkExperience {
            company: e.company,
            role: e.role,
            duration: e.duration,
            calculated_duration: 0,
        })
        .collect();

    let mut record = ResumeRecord {
        name: fields.name.trim().to_string(),
        mobile,
        email: fields.email.trim().to_string(),
        graduation: fields.graduation.trim().to_string(),
        skills: union_all(fields.skills),
        education: union_all(fields.education),
        experience: tidy_experience(experience, today),
        total_experience: 0,
        source_file,
        created_at: None,
    };
    record.recompute_total();
    Ok(record)
}

/// Re-applies the invariants to a record coming back from the reviewer,
/// who may have edited any field. Durations are recomputed from their text.
pub fn normalize_reviewed(
    mut record: ResumeRecord,
    today: NaiveDate,
) -> Result<ResumeRecord, AppError> {
    record.mobile = normalize_mobile(&record.mobile);
    if record.mobile.is_empty() {
        return Err(AppError::Validation(format!(
            "record '{}' has no mobile number",
            record.name
        )));
    }
    record.name = record.name.trim().to_string();
    record.email = record.email.trim().to_string();
    record.graduation = record.graduation.trim().to_string();
    record.skills = union_all(record.skills);
    record.education = union_all(record.education);
    record.experience = tidy_experience(record.experience, today);
    record.created_at = None;
    record.recompute_total();
    Ok(record)
}

/// Same clean-up as [`normalize_reviewed`] for an edit of a stored record.
pub fn normalize_update(update: ResumeUpdate, today: NaiveDate) -> ResumeUpdate {
    ResumeUpdate {
        name: update.name.trim().to_string(),
        email: update.email.trim().to_string(),
        graduation: update.graduation.trim().to_string(),
        skills: union_all(update.skills),
        education: union_all(update.education),
        experience: tidy_experience(update.experience, today),
    }
}

fn tidy_experience(experience: Vec<WorkExperience>, today: NaiveDate) -> Vec<WorkExperience> {
    experience
        .into_iter()
        .map(|e| WorkExperience {
            calculated_duration: calculate_duration(&e.duration, today),
            company: e.company.trim().to_string(),
            role: e.role.trim().to_string(),
            duration: e.duration.trim().to_string(),
        })
        .filter(|e| !(e.company.is_empty() && e.role.is_empty() && e.duration.is_empty()))
        .collect()
}

fn union_all(items: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(items.len());
    union_ci(&mut out, items);
    out
}

/// Appends trimmed, non-empty items not already present (ignoring case).
fn union_ci(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !target.iter().any(|t| t.eq_ignore_ascii_case(item)) {
            target.push(item.to_string());
        }
    }
}

/// Folds records that share a mobile into the first one seen.
fn merge_by_mobile(records: Vec<ResumeRecord>) -> Vec<ResumeRecord> {
    let mut merged: Vec<ResumeRecord> = Vec::new();
    for record in records {
        let Some(i) = merged.iter().position(|m| m.mobile == record.mobile) else {
            merged.push(record);
            continue;
        };
        let existing = &mut merged[i];
        for (field, value) in [
            (&mut existing.name, record.name),
            (&mut existing.email, record.email),
            (&mut existing.graduation, record.graduation),
        ] {
            if field.is_empty() {
                *field = value;
            }
        }
        union_ci(&mut existing.skills, record.skills);
        union_ci(&mut existing.education, record.education);
        existing.experience.extend(record.experience);
        existing.source_file = format!("{}, {}", existing.source_file, record.source_file);
        existing.recompute_total();
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{HeuristicFieldExtractor, RawExperience};
    use crate::test_support::{build_docx, build_pdf, build_zip, SAMPLE_RESUME};

    const LIMIT: usize = 1024 * 1024;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_normalize_mobile_keeps_digits_only() {
        assert_eq!(normalize_mobile("+91 (98765) 43-210"), "919876543210");
        assert_eq!(normalize_mobile("n/a"), "");
    }

    #[test]
    fn test_build_record_computes_durations_and_total() {
        let fields = ExtractedFields {
            name: " Asha Rao ".to_string(),
            mobiles: vec!["ext.".to_string(), "98765 43210".to_string()],
            skills: vec!["Rust".to_string(), "rust".to_string(), " ".to_string()],
            experience: vec![
                RawExperience {
                    company: "Acme".to_string(),
                    role: "Engineer".to_string(),
                    duration: "Jan 2020 - Mar 2021".to_string(),
                },
                RawExperience::default(),
            ],
            ..Default::default()
        };
        let record = build_record(fields, "cv.pdf".to_string(), today()).unwrap();
        assert_eq!(record.name, "Asha Rao");
        assert_eq!(record.mobile, "9876543210");
        assert_eq!(record.skills, vec!["Rust"]);
        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.experience[0].calculated_duration, 14);
        assert_eq!(record.total_experience, 14);
        assert_eq!(record.source_file, "cv.pdf");
    }

    #[test]
    fn test_build_record_without_mobile_fails() {
        let fields = ExtractedFields {
            name: "Asha Rao".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_record(fields, "cv.pdf".to_string(), today()),
            Err(ExtractError::MissingMobile)
        ));
    }

    #[test]
    fn test_normalize_reviewed_rejects_blank_mobile() {
        let record = ResumeRecord {
            name: "Asha".to_string(),
            mobile: " - ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            normalize_reviewed(record, today()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_normalize_reviewed_recomputes_durations_from_text() {
        let record = ResumeRecord {
            mobile: "98765-43210".to_string(),
            skills: vec!["SQL".to_string(), "sql ".to_string()],
            experience: vec![
                WorkExperience {
                    company: "Acme".to_string(),
                    duration: "Jan 2020 - Mar 2021".to_string(),
                    calculated_duration: 5,
                    ..Default::default()
                },
                WorkExperience {
                    company: "  ".to_string(),
                    ..Default::default()
                },
            ],
            total_experience: 100,
            created_at: NaiveDate::from_ymd_opt(2020, 1, 1),
            ..Default::default()
        };
        let record = normalize_reviewed(record, today()).unwrap();
        assert_eq!(record.mobile, "9876543210");
        assert_eq!(record.skills, vec!["SQL"]);
        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.experience[0].calculated_duration, 14);
        assert_eq!(record.total_experience, 14);
        assert!(record.created_at.is_none());
    }

    #[test]
    fn test_normalize_update_trims_and_recomputes() {
        let update = ResumeUpdate {
            name: " Asha Rao ".to_string(),
            email: String::new(),
            graduation: String::new(),
            skills: vec![],
            education: vec![],
            experience: vec![WorkExperience {
                company: "Acme".to_string(),
                duration: "2023 - Present".to_string(),
                ..Default::default()
            }],
        };
        let update = normalize_update(update, today());
        assert_eq!(update.name, "Asha Rao");
        assert_eq!(update.experience[0].calculated_duration, 17);
    }

    #[test]
    fn test_merge_by_mobile_combines_experience() {
        let a = ResumeRecord {
            name: "Asha".to_string(),
            mobile: "1".to_string(),
            skills: vec!["Rust".to_string()],
            experience: vec![WorkExperience {
                calculated_duration: 10,
                ..Default::default()
            }],
            source_file: "a.pdf".to_string(),
            ..Default::default()
        };
        let b = ResumeRecord {
            email: "asha@example.com".to_string(),
            mobile: "1".to_string(),
            skills: vec!["RUST".to_string(), "Go".to_string()],
            experience: vec![WorkExperience {
                calculated_duration: 4,
                ..Default::default()
            }],
            source_file: "b.pdf".to_string(),
            ..Default::default()
        };
        let c = ResumeRecord {
            mobile: "2".to_string(),
            ..Default::default()
        };
        let merged = merge_by_mobile(vec![a, c, b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "Asha");
        assert_eq!(merged[0].email, "asha@example.com");
        assert_eq!(merged[0].skills, vec!["Rust", "Go"]);
        assert_eq!(merged[0].total_experience, 14);
        assert_eq!(merged[0].source_file, "a.pdf, b.pdf");
    }

    #[tokio::test]
    async fn test_process_zip_batch_reports_per_file_errors() {
        let docx = build_docx(&["Ravi Kumar", "Mobile: 98450 12345", "Skills", "Go, Rust"]);
        let zip = build_zip(&[
            ("asha.txt", SAMPLE_RESUME.as_bytes()),
            ("ravi.docx", docx.as_slice()),
            ("photo.png", b"\x89PNG".as_slice()),
            ("nobody.txt", b"Just some words without contact details".as_slice()),
        ]);

        let preview =
            process_upload(&HeuristicFieldExtractor, "batch.zip", Bytes::from(zip), LIMIT, today())
                .await
                .unwrap();

        assert_eq!(preview.documents, 4);
        assert_eq!(preview.extractor, "heuristic");
        assert_eq!(preview.records.len(), 2);
        assert_eq!(preview.records[0].name, "Asha Rao");
        assert_eq!(preview.records[0].mobile, "919876543210");
        assert_eq!(preview.records[0].total_experience, 53 + 33);
        assert_eq!(preview.records[1].name, "Ravi Kumar");
        assert_eq!(preview.records[1].skills, vec!["Go", "Rust"]);

        let kinds: Vec<_> = preview.errors.iter().map(|e| e.error_type.as_str()).collect();
        assert_eq!(kinds, vec!["unsupported_format", "missing_mobile"]);
        assert_eq!(preview.errors[0].file_name, "photo.png");
        assert_eq!(preview.summary.total_candidates, 2);
    }

    #[tokio::test]
    async fn test_corrupt_zip_fails_the_upload() {
        let result = process_upload(
            &HeuristicFieldExtractor,
            "batch.zip",
            Bytes::from_static(b"nope"),
            LIMIT,
            today(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Extraction(ExtractError::Archive(_)))));
    }

    #[tokio::test]
    async fn test_zip_expanding_past_upload_limit_fails() {
        let padded = format!("{SAMPLE_RESUME}{}", " ".repeat(256 * 1024));
        let zip = build_zip(&[("asha.txt", padded.as_bytes())]);
        assert!(zip.len() < 16 * 1024);

        let result = process_upload(
            &HeuristicFieldExtractor,
            "batch.zip",
            Bytes::from(zip),
            64 * 1024,
            today(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Extraction(ExtractError::Archive(_)))));
    }

    #[tokio::test]
    async fn test_pdf_upload_produces_a_record() {
        let pdf = build_pdf(&["Ravi Kumar", "Mobile: 98450 12345", "ravi@example.com"]);

        let preview =
            process_upload(&HeuristicFieldExtractor, "ravi.pdf", Bytes::from(pdf), LIMIT, today())
                .await
                .unwrap();

        assert_eq!(preview.documents, 1);
        assert!(preview.errors.is_empty(), "{:?}", preview.errors);
        assert_eq!(preview.records[0].mobile, "9845012345");
        assert_eq!(preview.records[0].email, "ravi@example.com");
        assert_eq!(preview.records[0].source_file, "ravi.pdf");
    }
}
