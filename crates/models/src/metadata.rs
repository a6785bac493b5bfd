//! Stable chunk metadata keys (spec.md §6). Kept as `const`s rather than an
//! enum because the map these populate (`Chunk::metadata`) is a
//! `map<string,string>` by contract — callers outside this workspace read
//! these keys directly.

pub const SOURCE_TYPE: &str = "source_type";
pub const SOURCE_REF: &str = "source_ref";
pub const CHUNK: &str = "chunk";
pub const EXTRACT_METHOD: &str = "extract_method";
pub const DOCUMENT_ID: &str = "document_id";
pub const CHUNK_INDEX: &str = "chunk_index";
pub const CHUNK_COUNT: &str = "chunk_count";
pub const CONTENT_SHA256: &str = "content_sha256";
pub const CONTENT_RUNES: &str = "content_runes";
pub const PAGE: &str = "page";
pub const PAGE_QUALITY_SCORE: &str = "page_quality_score";
pub const PAGE_RUNES: &str = "page_runes";
pub const OCR_AVG_SCORE: &str = "ocr_avg_score";
pub const SECTION: &str = "section";

/// `source_type` values.
pub mod source_type {
    pub const PDF: &str = "pdf";
    pub const EPUB: &str = "epub";
    pub const TEXT: &str = "text";
}

/// `extract_method` values.
pub mod extract_method {
    pub const PDFTOTEXT: &str = "pdftotext";
    pub const BUILTIN_PDF: &str = "builtin-pdf";
    pub const PADDLEOCR: &str = "paddleocr";
    pub const EPUB_HTML: &str = "epub-html";
    pub const PLAIN_TEXT: &str = "plain-text";
}
