use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ParseError;
use crate::subprocess::Subprocess;

/// A single extracted page, tagged with the method that produced it and
/// the quality measure used to drive OCR fusion (spec.md §4.E step 2),
/// so callers have what they need to stamp `page`/`page_quality_score`/
/// `page_runes`/`ocr_avg_score` onto the chunks this page produces
/// (spec.md §6) without re-scoring the text themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct PageExtraction {
    pub page: u32,
    pub text: String,
    pub method: &'static str,
    pub quality: PageQuality,
    pub ocr_avg_score: Option<f64>,
}

/// Per-page quality measure from spec.md §4.E step 2.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageQuality {
    pub runes: usize,
    pub alpha_num_ratio: f64,
    pub avg_line_len: f64,
    pub score: f64,
}

pub fn score_page(text: &str) -> PageQuality {
    let runes = text.chars().count();
    let alpha_num = text.chars().filter(|c| c.is_alphanumeric()).count();
    let alpha_num_ratio = if runes == 0 { 0.0 } else { alpha_num as f64 / runes as f64 };

    let non_empty_lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    let avg_line_len = if non_empty_lines == 0 { 0.0 } else { runes as f64 / non_empty_lines as f64 };

    let length_score = (runes as f64 / 300.0).clamp(0.0, 1.0);
    let density_score = (avg_line_len / 24.0).clamp(0.0, 1.0);
    let score = 0.45 * length_score + 0.30 * alpha_num_ratio + 0.25 * density_score;

    PageQuality { runes, alpha_num_ratio, avg_line_len, score }
}

/// Thresholds controlling when a native page is treated as low quality
/// and OCR is invoked (spec.md §4.E / §9's dynamic config list).
#[derive(Clone, Copy, Debug)]
pub struct PdfPipelineConfig {
    pub min_page_runes: usize,
    pub min_page_score: f64,
    pub ocr_min_score_delta: f64,
    pub ocr_enabled: bool,
}

impl Default for PdfPipelineConfig {
    fn default() -> Self {
        Self { min_page_runes: 200, min_page_score: 0.5, ocr_min_score_delta: 0.1, ocr_enabled: true }
    }
}

fn is_low_quality(quality: &PageQuality, config: &PdfPipelineConfig) -> bool {
    quality.runes < config.min_page_runes || quality.score < config.min_page_score
}

/// The "external layout-aware extractor" of spec.md §4.E step 1, modeled
/// as a `Subprocess`-backed trait so a test double can stand in without
/// shelling out.
#[async_trait]
pub trait NativePdfExtractor: Send + Sync {
    async fn extract(&self, path: &str) -> Result<Vec<PageExtraction>, ParseError>;
}

/// Shells out to `pdftotext -layout` and splits on its form-feed page
/// breaks. This is the preferred extractor; `BuiltinPdfExtractor` is the
/// fallback named in spec.md §4.E step 1.
pub struct PdftotextExtractor;

#[async_trait]
impl NativePdfExtractor for PdftotextExtractor {
    async fn extract(&self, path: &str) -> Result<Vec<PageExtraction>, ParseError> {
        let output = Command::new("pdftotext").arg("-layout").arg(path).arg("-").execute().await?;
        Ok(output
            .split('\u{000C}')
            .enumerate()
            .map(|(i, text)| {
                let quality = score_page(&text);
                PageExtraction {
                    page: i as u32 + 1,
                    text: text.to_string(),
                    method: models::metadata::extract_method::PDFTOTEXT,
                    quality,
                    ocr_avg_score: None,
                }
            })
            .collect())
    }
}

/// Built-in fallback used when the external extractor is unavailable or
/// fails, per spec.md §4.E step 1 ("on failure, fall back to a built-in
/// PDF reader"). Backed by `lopdf`'s own basic per-page text extraction,
/// which runs purely in-process with no external binary.
pub struct BuiltinPdfExtractor;

#[async_trait]
impl NativePdfExtractor for BuiltinPdfExtractor {
    async fn extract(&self, path: &str) -> Result<Vec<PageExtraction>, ParseError> {
        let path = path.to_string();
        let pages = tokio::task::spawn_blocking(move || extract_with_lopdf(&path))
            .await
            .map_err(|e| ParseError::Other(anyhow::anyhow!(e)))??;

        if pages.is_empty() {
            return Err(ParseError::NoContent);
        }
        Ok(pages)
    }
}

fn extract_with_lopdf(path: &str) -> Result<Vec<PageExtraction>, ParseError> {
    let document = lopdf::Document::load(path).map_err(|e| ParseError::Other(anyhow::anyhow!(e)))?;

    let mut page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();

    Ok(page_numbers
        .into_iter()
        .map(|page_number| {
            let text = document.extract_text(&[page_number]).unwrap_or_default();
            let quality = score_page(&text);
            PageExtraction {
                page: page_number,
                text,
                method: models::metadata::extract_method::BUILTIN_PDF,
                quality,
                ocr_avg_score: None,
            }
        })
        .collect())
}

/// The OCR extractor of spec.md §4.E step 4, invoked only when enabled
/// and native extraction left pages missing or low quality.
#[async_trait]
pub trait OcrExtractor: Send + Sync {
    async fn extract(&self, path: &str) -> Result<Vec<(u32, String, f64)>, ParseError>;
}

pub struct TesseractExtractor;

#[async_trait]
impl OcrExtractor for TesseractExtractor {
    async fn extract(&self, path: &str) -> Result<Vec<(u32, String, f64)>, ParseError> {
        let output = Command::new("tesseract").arg(path).arg("stdout").execute().await?;
        Ok(vec![(1, output, 0.0)])
    }
}

/// Runs native extraction (falling back to the built-in reader on
/// failure), conditionally runs OCR, and fuses the two per spec.md
/// §4.E steps 1–5.
pub async fn extract_pages(
    path: &str,
    native: &dyn NativePdfExtractor,
    fallback: &dyn NativePdfExtractor,
    ocr: &dyn OcrExtractor,
    config: &PdfPipelineConfig,
) -> Result<Vec<PageExtraction>, ParseError> {
    let native_pages = match native.extract(path).await {
        Ok(pages) if !pages.is_empty() => pages,
        Ok(_) => {
            tracing::warn!(path, "native extractor produced no pages, falling back to built-in reader");
            fallback.extract(path).await.unwrap_or_default()
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "native extractor failed, falling back to built-in reader");
            fallback.extract(path).await.unwrap_or_default()
        }
    };

    let native_by_page: BTreeMap<u32, &PageExtraction> = native_pages.iter().map(|p| (p.page, p)).collect();
    let any_low_quality = native_by_page.values().any(|p| is_low_quality(&p.quality, config));

    let ocr_pages = if config.ocr_enabled && (native_pages.is_empty() || any_low_quality) {
        tracing::info!(path, "running OCR extraction over low-quality or missing native pages");
        ocr.extract(path).await.unwrap_or_default()
    } else {
        Vec::new()
    };
    let ocr_by_page: BTreeMap<u32, (String, f64)> = ocr_pages.into_iter().map(|(page, text, score)| (page, (text, score))).collect();

    let mut all_pages: Vec<u32> = native_by_page.keys().copied().chain(ocr_by_page.keys().copied()).collect();
    all_pages.sort_unstable();
    all_pages.dedup();

    let mut fused = Vec::new();
    for page in all_pages {
        let native_page = native_by_page.get(&page);
        let ocr_page = ocr_by_page.get(&page);

        let chosen = match (native_page, ocr_page) {
            (Some(n), Some((ocr_text, ocr_avg_score))) => {
                let ocr_quality = score_page(ocr_text);
                let ocr_effective = 0.8 * ocr_quality.score + 0.2 * ocr_avg_score;
                if is_low_quality(&n.quality, config) && ocr_effective >= n.quality.score + config.ocr_min_score_delta {
                    PageExtraction {
                        page,
                        text: ocr_text.clone(),
                        method: models::metadata::extract_method::PADDLEOCR,
                        quality: ocr_quality,
                        ocr_avg_score: Some(*ocr_avg_score),
                    }
                } else {
                    let mut chosen = (*n).clone();
                    chosen.ocr_avg_score = Some(*ocr_avg_score);
                    chosen
                }
            }
            (Some(n), None) => (*n).clone(),
            (None, Some((ocr_text, ocr_avg_score))) => {
                let ocr_quality = score_page(ocr_text);
                PageExtraction {
                    page,
                    text: ocr_text.clone(),
                    method: models::metadata::extract_method::PADDLEOCR,
                    quality: ocr_quality,
                    ocr_avg_score: Some(*ocr_avg_score),
                }
            }
            (None, None) => continue,
        };
        fused.push(chosen);
    }

    if fused.is_empty() {
        return Err(ParseError::NoContent);
    }
    Ok(fused)
}
