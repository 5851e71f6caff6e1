//! docchat-extract
//!
//! PDF-to-text extraction. Opaque from the caller's point of view:
//! bytes in, extracted text out, `ExtractError` on failure. Callers
//! must not publish any document state unless this succeeds.

pub mod error;

use tracing::info;

use crate::error::ExtractError;

/// Extract the text content of a PDF held in memory.
///
/// Fails when the bytes are not a parseable PDF, and when the PDF
/// parses but yields no text at all (scanned/image-only documents),
/// since an empty document context would silently ground the chat in
/// nothing.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Parse(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(ExtractError::NoText);
    }

    info!(chars = text.len(), "extracted text from PDF");

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-page PDF drawing `text` with the built-in Helvetica font;
    /// xref offsets are computed while the body is written.
    fn pdf_with_text(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (index, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", index + 1).as_bytes());
        }

        let xref_offset = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn text_pdf_yields_its_text() {
        let pdf = pdf_with_text("Alice is a software engineer.");
        let text = extract_text(&pdf).unwrap();
        assert!(text.contains("Alice is a software engineer."));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(extract_text(&[]).is_err());
    }

    #[test]
    fn garbage_input_is_an_error() {
        let err = extract_text(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
