//! Document text extraction — turns `.pdf` / `.txt` files into plain text.
//!
//! PDF text is cleaned (zero-width spaces removed, non-breaking spaces
//! replaced, whitespace collapsed). Any other extension is rejected with
//! `AppError::UnsupportedFormat`.

pub mod section;

pub use section::extract_relevant_section;

use std::path::Path;

use tracing::debug;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Detects the format from a file name's extension (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, AppError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("txt") => Ok(DocumentFormat::Text),
            _ => Err(AppError::UnsupportedFormat(format!(
                "'{name}' is not supported. Use .pdf or .txt"
            ))),
        }
    }
}

/// Reads and decodes the document at `path`. Blocking.
pub fn extract_text(path: &Path) -> Result<String, AppError> {
    let name = path.display().to_string();
    let format = DocumentFormat::from_name(&name)?;

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::NotFound(format!("File {name} not found")),
        _ => AppError::Extraction(format!("Could not read {name}: {e}")),
    })?;

    decode(format, &name, &bytes)
}

/// Decodes an uploaded document. `filename` decides the format. Blocking.
pub fn extract_text_from_bytes(filename: &str, bytes: &[u8]) -> Result<String, AppError> {
    let format = DocumentFormat::from_name(filename)?;
    decode(format, filename, bytes)
}

fn decode(format: DocumentFormat, name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let text = match format {
        DocumentFormat::Pdf => {
            let raw = pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| AppError::Extraction(format!("Could not parse PDF {name}: {e}")))?;
            clean_pdf_text(&raw)
        }
        DocumentFormat::Text => String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Extraction(format!("{name} is not valid UTF-8 text")))?,
    };

    debug!("Extracted {} chars from {name} ({format:?})", text.len());
    Ok(text)
}

/// Removes zero-width spaces, replaces non-breaking spaces, collapses all
/// whitespace runs to one space and trims.
pub fn clean_pdf_text(raw: &str) -> String {
    raw.replace('\u{200B}', "")
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(DocumentFormat::from_name("cv.pdf").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_name("CV.PDF").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_name("jd.txt").unwrap(), DocumentFormat::Text);
    }

    #[test]
    fn test_unsupported_format() {
        for name in ["resume.docx", "resume", "archive.tar.gz"] {
            assert!(
                matches!(DocumentFormat::from_name(name), Err(AppError::UnsupportedFormat(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn test_extract_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.txt");
        std::fs::write(&path, "Skills:\nPython, SQL").unwrap();
        assert_eq!(extract_text(&path).unwrap(), "Skills:\nPython, SQL");
    }

    #[test]
    fn test_unsupported_extension_checked_before_reading() {
        let err = extract_text(Path::new("/no/such/resume.docx")).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = extract_text(Path::new("/no/such/resume.txt")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_invalid_utf8_is_extraction_error() {
        let err = extract_text_from_bytes("jd.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_garbage_pdf_is_extraction_error() {
        let err = extract_text_from_bytes("cv.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_clean_pdf_text() {
        let raw = "Python\u{200B}ista\u{a0}with   SQL\n\n\tand Docker  ";
        assert_eq!(clean_pdf_text(raw), "Pythonista with SQL and Docker");
    }
}
