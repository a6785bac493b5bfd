pub mod chunker;
pub mod epub;
pub mod error;
pub mod normalize;
pub mod pdf;
pub mod provenance;
pub mod subprocess;
pub mod text;

use models::{metadata, Chunk, Id};
use pdf::PageExtraction;

pub use chunker::ChunkerConfig;
pub use error::ParseError;
pub use pdf::{NativePdfExtractor, OcrExtractor, PdfPipelineConfig};

/// Recognized document kinds; anything else falls back to plain text per
/// spec.md §4.E's "else plain text."
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Epub,
    Text,
}

/// Dispatches by extension, case-insensitively.
pub fn dispatch(filename: &str) -> SourceKind {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        SourceKind::Pdf
    } else if lower.ends_with(".epub") {
        SourceKind::Epub
    } else {
        SourceKind::Text
    }
}

/// Turns one already-normalized source unit (a PDF page, an EPUB
/// section, or the whole plain-text document) into provenance-tagged,
/// chunked `Chunk` rows, assigning the per-unit `chunk` ordinal. Callers
/// assemble multiple units (e.g. every PDF page) and then call
/// `assign_document_ordinals` to fill in the document-wide
/// `chunk_index`/`chunk_count`/`document_id`.
pub fn chunk_unit(
    book_id: Id,
    source_ref: &str,
    extract_method: &str,
    source_type: &str,
    text: &str,
    extra: &[(&str, String)],
    chunker_config: ChunkerConfig,
) -> Vec<Chunk> {
    let normalized = normalize::normalize(text);
    let mut base = provenance::base_metadata(source_type, source_ref, extract_method);
    for (key, value) in extra {
        base.insert(key.to_string(), value.clone());
    }

    chunker::chunk(&normalized, chunker_config)
        .into_iter()
        .enumerate()
        .map(|(ordinal, content)| {
            let meta = provenance::annotate_chunk(&base, ordinal, &content);
            Chunk {
                id: Id::new(),
                book_id,
                content,
                metadata: meta,
                embedding: None,
                created_at: chrono::Utc::now(),
            }
        })
        .collect()
}

/// Chunks one fused PDF page, stamping `page`/`page_quality_score`/
/// `page_runes`/`ocr_avg_score` (spec.md §6) onto every chunk it
/// produces, the same way `chunk_unit` stamps `source_type`/
/// `extract_method`/`source_ref` for every source kind.
pub fn chunk_pdf_page(book_id: Id, source_ref: &str, page: &PageExtraction, chunker_config: ChunkerConfig) -> Vec<Chunk> {
    let mut extra = vec![
        (metadata::PAGE, page.page.to_string()),
        (metadata::PAGE_QUALITY_SCORE, page.quality.score.to_string()),
        (metadata::PAGE_RUNES, page.quality.runes.to_string()),
    ];
    if let Some(ocr_avg_score) = page.ocr_avg_score {
        extra.push((metadata::OCR_AVG_SCORE, ocr_avg_score.to_string()));
    }

    chunk_unit(
        book_id,
        source_ref,
        page.method,
        metadata::source_type::PDF,
        &page.text,
        &extra,
        chunker_config,
    )
}

/// Stamps `document_id`, `chunk_index`, `chunk_count` across the full
/// set of chunks produced for a book, after every source unit has been
/// chunked (spec.md §6's chunk metadata key list).
pub fn assign_document_ordinals(book_id: Id, chunks: &mut [Chunk]) {
    let count = chunks.len();
    for (index, chunk) in chunks.iter_mut().enumerate() {
        chunk.metadata.insert(metadata::DOCUMENT_ID.to_string(), book_id.to_string());
        chunk.metadata.insert(metadata::CHUNK_INDEX.to_string(), index.to_string());
        chunk.metadata.insert(metadata::CHUNK_COUNT.to_string(), count.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_is_case_insensitive_with_text_fallback() {
        assert_eq!(dispatch("Report.PDF"), SourceKind::Pdf);
        assert_eq!(dispatch("Book.EPUB"), SourceKind::Epub);
        assert_eq!(dispatch("notes.md"), SourceKind::Text);
        assert_eq!(dispatch("noextension"), SourceKind::Text);
    }

    #[test]
    fn chunk_unit_tags_provenance_and_ordinal() {
        let book_id = Id::new();
        let chunks = chunk_unit(
            book_id,
            "text",
            metadata::extract_method::PLAIN_TEXT,
            metadata::source_type::TEXT,
            "Just one short sentence.",
            &[],
            ChunkerConfig::default(),
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.get(metadata::CHUNK).unwrap(), "0");
        assert_eq!(chunks[0].metadata.get(metadata::SOURCE_TYPE).unwrap(), metadata::source_type::TEXT);
    }

    #[test]
    fn chunk_pdf_page_stamps_page_metadata() {
        let book_id = Id::new();
        let page = pdf::PageExtraction {
            page: 3,
            text: "Some extracted page text with enough words to form a chunk.".to_string(),
            method: metadata::extract_method::PDFTOTEXT,
            quality: pdf::score_page("Some extracted page text with enough words to form a chunk."),
            ocr_avg_score: Some(0.82),
        };
        let chunks = chunk_pdf_page(book_id, "book.pdf", &page, ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.get(metadata::PAGE).unwrap(), "3");
        assert_eq!(chunks[0].metadata.get(metadata::OCR_AVG_SCORE).unwrap(), "0.82");
        assert!(chunks[0].metadata.contains_key(metadata::PAGE_QUALITY_SCORE));
        assert!(chunks[0].metadata.contains_key(metadata::PAGE_RUNES));
        assert_eq!(chunks[0].metadata.get(metadata::SOURCE_TYPE).unwrap(), metadata::source_type::PDF);
    }

    #[test]
    fn chunk_pdf_page_omits_ocr_score_when_none() {
        let book_id = Id::new();
        let page = pdf::PageExtraction {
            page: 1,
            text: "Plain native text with no OCR involvement at all here.".to_string(),
            method: metadata::extract_method::PDFTOTEXT,
            quality: pdf::score_page("Plain native text with no OCR involvement at all here."),
            ocr_avg_score: None,
        };
        let chunks = chunk_pdf_page(book_id, "book.pdf", &page, ChunkerConfig::default());
        assert!(chunks[0].metadata.get(metadata::OCR_AVG_SCORE).is_none());
    }

    #[test]
    fn assign_document_ordinals_stamps_index_and_count() {
        let book_id = Id::new();
        let mut chunks = chunk_unit(
            book_id,
            "text",
            metadata::extract_method::PLAIN_TEXT,
            metadata::source_type::TEXT,
            "One. Two. Three.",
            &[],
            ChunkerConfig { target_size: 6, overlap: 0 },
        );
        assign_document_ordinals(book_id, &mut chunks);
        let count = chunks.len();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.metadata.get(metadata::CHUNK_INDEX).unwrap(), &i.to_string());
            assert_eq!(c.metadata.get(metadata::CHUNK_COUNT).unwrap(), &count.to_string());
            assert_eq!(c.metadata.get(metadata::DOCUMENT_ID).unwrap(), &book_id.to_string());
        }
    }
}
