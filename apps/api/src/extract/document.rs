//! Per-format text extraction. PDF goes through `pdf-extract`; DOCX through
//! `docx-rs`, walking the body paragraphs and tables in document order.

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::ExtractError;

static HORIZONTAL_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Classifies by extension. Legacy binary `.doc` is not readable.
    pub fn from_file_name(name: &str) -> Result<Self, ExtractError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "txt" => Ok(DocumentKind::PlainText),
            "doc" => Err(ExtractError::UnsupportedFormat(format!(
                "{name}: legacy .doc files are not supported, save as .docx or PDF"
            ))),
            _ => Err(ExtractError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Extracts normalized plain text from one document.
///
/// Blocking: callers on the async runtime must wrap this in `spawn_blocking`.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    let raw = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        DocumentKind::Docx => docx_text(bytes)?,
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };

    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(ExtractError::EmptyText);
    }
    Ok(text)
}

fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut out = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => push_paragraph(&mut out, p),
            DocumentChild::Table(t) => push_table(&mut out, t),
            _ => {}
        }
    }
    Ok(out)
}

fn push_paragraph(out: &mut String, paragraph: &Paragraph) {
    push_paragraph_children(out, &paragraph.children);
    out.push('\n');
}

fn push_paragraph_children(out: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(out, run),
            ParagraphChild::Hyperlink(link) => push_paragraph_children(out, &link.children),
            _ => {}
        }
    }
}

fn push_run(out: &mut String, run: &Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Resume layouts often put contact details or dated entries in table
/// cells; every cell paragraph becomes its own line.
fn push_table(out: &mut String, table: &Table) {
    for TableChild::TableRow(row) in &table.rows {
        for TableRowChild::TableCell(cell) in &row.cells {
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(p) => push_paragraph(out, p),
                    TableCellContent::Table(t) => push_table(out, t),
                    _ => {}
                }
            }
        }
    }
}

/// Trims every line, collapses horizontal whitespace, and keeps at most one
/// blank line between blocks.
pub fn normalize_text(raw: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut last_blank = true;
    for line in raw.replace('\r', "\n").replace('\u{000C}', "\n").lines() {
        let line = HORIZONTAL_WS_RE.replace_all(line.trim(), " ");
        if line.is_empty() {
            if !last_blank {
                out.push(String::new());
            }
            last_blank = true;
        } else {
            out.push(line.into_owned());
            last_blank = false;
        }
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
