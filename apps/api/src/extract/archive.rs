use std::io::{Cursor, Read};

use bytes::Bytes;
use tracing::debug;

use crate::extract::ExtractError;

/// One file taken from an upload, either the upload itself or a zip member.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Expands a `.zip` upload into its member documents, in archive order.
/// Any other upload is passed through as a single document.
///
/// Members are read into memory; nothing touches the filesystem. Entries
/// without a safe enclosed path (`../` tricks, absolute paths) are dropped.
/// The decompressed total may not exceed `limit` bytes, whatever sizes the
/// archive declares.
///
/// Blocking: callers on the async runtime must wrap this in `spawn_blocking`.
pub fn expand_upload(
    file_name: &str,
    bytes: Bytes,
    limit: usize,
) -> Result<Vec<UploadedDocument>, ExtractError> {
    if !file_name.to_ascii_lowercase().ends_with(".zip") {
        return Ok(vec![UploadedDocument {
            file_name: base_name(file_name).to_string(),
            bytes,
        }]);
    }

    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Archive(e.to_string()))?;

    let mut documents = Vec::new();
    let mut remaining = limit as u64;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }
        let Some(path) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            debug!("Skipping unsafe zip entry {}", entry.name());
            continue;
        };
        if path.components().any(|c| c.as_os_str() == "__MACOSX") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let mut buf = Vec::new();
        entry
            .by_ref()
            .take(remaining + 1)
            .read_to_end(&mut buf)
            .map_err(|e| ExtractError::Archive(format!("{name}: {e}")))?;
        if buf.len() as u64 > remaining {
            return Err(ExtractError::Archive(format!(
                "{name}: archive expands past the {limit}-byte upload limit"
            )));
        }
        remaining -= buf.len() as u64;
        documents.push(UploadedDocument {
            file_name: name,
            bytes: Bytes::from(buf),
        });
    }

    debug!("Expanded {file_name} into {} documents", documents.len());
    Ok(documents)
}

/// Browsers may send a full client path as the file name.
fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_zip;

    const LIMIT: usize = 1024 * 1024;

    #[test]
    fn test_non_zip_passes_through() {
        let docs =
            expand_upload("C:\\Users\\me\\cv.pdf", Bytes::from_static(b"%PDF"), LIMIT).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_name, "cv.pdf");
    }

    #[test]
    fn test_zip_members_in_order_with_base_names() {
        let zip = build_zip(&[
            ("batch/", b"".as_slice()),
            ("batch/b.txt", b"second".as_slice()),
            ("batch/nested/a.pdf", b"first".as_slice()),
        ]);
        let docs = expand_upload("resumes.ZIP", Bytes::from(zip), LIMIT).unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "a.pdf"]);
        assert_eq!(&docs[0].bytes[..], b"second");
    }

    #[test]
    fn test_zip_skips_resource_forks_dotfiles_and_traversal() {
        let zip = build_zip(&[
            ("__MACOSX/._cv.pdf", b"junk".as_slice()),
            (".DS_Store", b"junk".as_slice()),
            ("../escape.txt", b"junk".as_slice()),
            ("cv.txt", b"ok".as_slice()),
        ]);
        let docs = expand_upload("upload.zip", Bytes::from(zip), LIMIT).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_name, "cv.txt");
    }

    #[test]
    fn test_corrupt_zip_is_archive_error() {
        let result = expand_upload("upload.zip", Bytes::from_static(b"PK not really"), LIMIT);
        assert!(matches!(result, Err(ExtractError::Archive(_))));
    }

    #[test]
    fn test_member_expanding_past_limit_is_rejected() {
        let zeros = vec![0u8; 64 * 1024];
        let zip = build_zip(&[("bomb.txt", zeros.as_slice())]);
        assert!(zip.len() < 4 * 1024);
        let result = expand_upload("upload.zip", Bytes::from(zip), 16 * 1024);
        assert!(matches!(result, Err(ExtractError::Archive(msg)) if msg.contains("limit")));
    }

    #[test]
    fn test_batch_total_counts_against_limit() {
        let part = vec![b'a'; 600];
        let zip = build_zip(&[("a.txt", part.as_slice()), ("b.txt", part.as_slice())]);
        assert!(expand_upload("upload.zip", Bytes::from(zip.clone()), 1000).is_err());
        assert_eq!(expand_upload("upload.zip", Bytes::from(zip), 1200).unwrap().len(), 2);
    }
}
