// PDF text extraction with lopdf, one segment per page

use lopdf::Document;
use tracing::{debug, warn};

use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TextDocument {
    pub text: String,
    pub page_count: usize,
}

/// Extract the text of every page in document order, joined with `\n`.
///
/// Pages without extractable text still contribute an (empty) segment so the
/// output always has exactly one segment per page.
pub fn extract_text(bytes: &[u8]) -> AppResult<TextDocument> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| AppError::MalformedInput(format!("PDF: {}", e)))?;

    // get_pages is keyed by 1-based page number, so iteration is in page order
    let pages = doc.get_pages();
    let segments: Vec<String> = pages
        .keys()
        .map(|&page_number| match doc.extract_text(&[page_number]) {
            Ok(text) => text.trim_end_matches(['\r', '\n']).to_string(),
            Err(e) => {
                warn!(page = page_number, error = %e, "No extractable text on page");
                String::new()
            }
        })
        .collect();

    debug!(pages = segments.len(), "Extracted PDF text");
    Ok(TextDocument {
        text: segments.join("\n"),
        page_count: segments.len(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a PDF with one page per entry; `None` yields a page with no text.
    pub fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in pages {
            let operations = match page {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save pdf");
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::build_pdf;
    use super::*;

    #[test]
    fn test_extract_text_keeps_page_order() {
        let bytes = build_pdf(&[Some("First page"), Some("Second page")]);
        let doc = extract_text(&bytes).unwrap();

        assert_eq!(doc.page_count, 2);
        let segments: Vec<&str> = doc.text.split('\n').collect();
        assert_eq!(segments.len(), 2);
        assert!(segments[0].contains("First page"));
        assert!(segments[1].contains("Second page"));
    }

    #[test]
    fn test_empty_interior_page_contributes_empty_segment() {
        let bytes = build_pdf(&[Some("Alpha"), None, Some("Omega")]);
        let doc = extract_text(&bytes).unwrap();

        assert_eq!(doc.page_count, 3);
        let segments: Vec<&str> = doc.text.split('\n').collect();
        assert_eq!(segments.len(), 3);
        assert!(segments[0].contains("Alpha"));
        assert!(segments[1].trim().is_empty());
        assert!(segments[2].contains("Omega"));
    }

    #[test]
    fn test_invalid_pdf_is_malformed() {
        let err = extract_text(b"%PDF-1.5 this is not really a pdf").unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
    }
}
