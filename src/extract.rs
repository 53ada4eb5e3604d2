//! Text extraction from uploaded contract documents.
//!
//! Takes the uploaded bytes plus the original filename; the format is
//! detected from the extension. PDF and DOCX are what counterparties
//! actually send; plain text and markdown pass through unchanged.

use std::io::Cursor;
use std::path::Path;

use thiserror::Error;

/// Cap on extracted text handed to the analysis prompt.
const MAX_EXTRACT_BYTES: usize = 100_000;

/// Supported upload formats, detected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    /// .txt, .md; read as-is.
    PlainText,
    Unsupported,
}

/// Errors that can occur while turning an upload into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format: .{0}")]
    UnsupportedFormat(String),

    #[error("document contained no extractable text")]
    EmptyDocument,

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

/// Detect the document format from the uploaded filename.
pub fn detect_format(filename: &str) -> DocumentFormat {
    let ext = extension_of(filename);
    match ext.as_str() {
        "pdf" => DocumentFormat::Pdf,
        "docx" => DocumentFormat::Docx,
        "txt" | "md" | "markdown" => DocumentFormat::PlainText,
        _ => DocumentFormat::Unsupported,
    }
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Extract text from an uploaded document.
///
/// Returns the text truncated to [`MAX_EXTRACT_BYTES`]; a document that
/// yields only whitespace is reported as a failure so the analysis flow
/// aborts instead of prompting on nothing.
pub fn extract_text(filename: &str, content: &[u8]) -> Result<String, ExtractError> {
    let raw = match detect_format(filename) {
        DocumentFormat::Pdf => extract_pdf(content)?,
        DocumentFormat::Docx => extract_docx(content)?,
        DocumentFormat::PlainText => String::from_utf8_lossy(content).into_owned(),
        DocumentFormat::Unsupported => {
            return Err(ExtractError::UnsupportedFormat(extension_of(filename)));
        }
    };

    if raw.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    Ok(truncate_to_bytes(raw, MAX_EXTRACT_BYTES))
}

fn extract_pdf(content: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract can panic on malformed PDFs, so the call is fenced
    let bytes = content.to_vec();
    let result = std::panic::catch_unwind(move || pdf_extract::extract_text_from_mem(&bytes));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::ExtractionFailed(format!("PDF: {e}"))),
        Err(_) => Err(ExtractError::ExtractionFailed(
            "PDF extraction panicked (malformed file)".to_string(),
        )),
    }
}

fn extract_docx(content: &[u8]) -> Result<String, ExtractError> {
    // DOCX = ZIP archive containing word/document.xml.
    // Walk <w:t> tags to extract text runs, breaking on paragraphs.
    let mut archive = zip::ZipArchive::new(Cursor::new(content))
        .map_err(|e| ExtractError::ExtractionFailed(format!("DOCX zip: {e}")))?;

    let doc = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::ExtractionFailed(format!("DOCX missing document.xml: {e}")))?;

    let mut reader = quick_xml::Reader::from_reader(std::io::BufReader::new(doc));
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text_tag = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e))
            | Ok(quick_xml::events::Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_tag = true;
                }
            }
            Ok(quick_xml::events::Event::End(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_tag = false;
                } else if e.local_name().as_ref() == b"p"
                    && !text.is_empty()
                    && !text.ends_with('\n')
                {
                    text.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Text(ref e)) => {
                if in_text_tag {
                    if let Ok(s) = e.unescape() {
                        text.push_str(&s);
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::ExtractionFailed(format!("DOCX XML: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Truncate to at most `max_bytes` without splitting a UTF-8 character.
fn truncate_to_bytes(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn minimal_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .expect("start file");
        writer.write_all(xml.as_bytes()).expect("write xml");
        writer.finish().expect("finish zip").into_inner()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("msa.pdf"), DocumentFormat::Pdf);
        assert_eq!(detect_format("MSA.PDF"), DocumentFormat::Pdf);
        assert_eq!(detect_format("terms.docx"), DocumentFormat::Docx);
        assert_eq!(detect_format("notes.md"), DocumentFormat::PlainText);
        assert_eq!(detect_format("scan.png"), DocumentFormat::Unsupported);
        assert_eq!(detect_format("no_extension"), DocumentFormat::Unsupported);
    }

    #[test]
    fn test_plaintext_passthrough() {
        let text = extract_text("contract.txt", b"Payment is due Net 30.").expect("extract");
        assert_eq!(text, "Payment is due Net 30.");
    }

    #[test]
    fn test_whitespace_only_document_is_rejected() {
        let result = extract_text("contract.txt", b"  \n\t ");
        assert!(matches!(result, Err(ExtractError::EmptyDocument)));
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let result = extract_text("contract.png", b"binary");
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(ext)) if ext == "png"));
    }

    #[test]
    fn test_docx_extraction_joins_paragraphs() {
        let docx = minimal_docx(&["Term and Termination.", "Payment Terms: Net 30."]);
        let text = extract_text("contract.docx", &docx).expect("extract");
        assert_eq!(text, "Term and Termination.\nPayment Terms: Net 30.\n");
    }

    #[test]
    fn test_docx_without_document_xml_is_rejected() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .expect("start file");
        writer.write_all(b"<x/>").expect("write");
        let bytes = writer.finish().expect("finish").into_inner();

        let result = extract_text("contract.docx", &bytes);
        assert!(matches!(result, Err(ExtractError::ExtractionFailed(_))));
    }

    #[test]
    fn test_malformed_pdf_is_an_error_not_a_panic() {
        let result = extract_text("contract.pdf", b"not a pdf at all");
        assert!(matches!(result, Err(ExtractError::ExtractionFailed(_))));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(10); // 2 bytes per char
        let out = truncate_to_bytes(text, 5);
        assert_eq!(out, "é".repeat(2));
        assert_eq!(out.len(), 4);
    }
}
