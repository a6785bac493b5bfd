use std::io::Read;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::ParseError;

/// One `.xhtml`/`.html`/`.htm` entry's concatenated text, keyed by its
/// base filename (used for `source_ref=section:<entryBasename>`,
/// spec.md §4.E).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpubSection {
    pub name: String,
    pub text: String,
}

const SKIPPED_TAGS: &[&str] = &["script", "style"];
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article", "blockquote", "tr",
];

/// Iterates an EPUB archive's markup entries and extracts their text
/// nodes, per spec.md §4.E: skip `<script>`/`<style>`, insert a
/// paragraph break after block-level elements and `<br>`.
pub fn extract_sections(archive_bytes: &[u8]) -> Result<Vec<EpubSection>, ParseError> {
    let reader = std::io::Cursor::new(archive_bytes);
    let mut zip = ZipArchive::new(reader)?;

    let mut sections = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        if !is_markup_entry(&name) {
            continue;
        }

        let mut contents = String::new();
        entry.read_to_string(&mut contents).map_err(|e| ParseError::Other(e.into()))?;
        let text = extract_text(&contents)?;
        let base = basename(&name);
        sections.push(EpubSection { name: base, text });
    }
    Ok(sections)
}

fn is_markup_entry(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".xhtml") || lower.ends_with(".html") || lower.ends_with(".htm")
}

fn basename(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

fn extract_text(markup: &str) -> Result<String, ParseError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text = false;

    let mut out = String::new();
    let mut skip_depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = local_name(e.name().as_ref());
                if SKIPPED_TAGS.contains(&name.as_str()) {
                    skip_depth += 1;
                } else if BLOCK_TAGS.contains(&name.as_str()) {
                    out.push_str("\n\n");
                }
            }
            Event::Empty(e) => {
                let name = local_name(e.name().as_ref());
                if name == "br" {
                    out.push_str("\n\n");
                }
            }
            Event::End(e) => {
                let name = local_name(e.name().as_ref());
                if SKIPPED_TAGS.contains(&name.as_str()) {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if BLOCK_TAGS.contains(&name.as_str()) {
                    out.push_str("\n\n");
                }
            }
            Event::Text(e) => {
                if skip_depth == 0 {
                    let text = e.unescape().unwrap_or_default();
                    out.push_str(&text);
                }
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn local_name(qname: &[u8]) -> String {
    let s = String::from_utf8_lossy(qname);
    s.rsplit(':').next().unwrap_or(&s).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_content() {
        let html = "<html><body><style>.x{color:red}</style><script>alert(1)</script><p>Real text</p></body></html>";
        let text = extract_text(html).unwrap();
        assert!(text.contains("Real text"));
        assert!(!text.contains("color:red"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn inserts_paragraph_breaks_around_block_elements_and_br() {
        let html = "<p>First</p><p>Second</p><div>Third<br/>Fourth</div>";
        let text = extract_text(html).unwrap();
        let collapsed: Vec<&str> = text.split("\n\n").map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
        assert_eq!(collapsed, vec!["First", "Second", "Third", "Fourth"]);
    }

    #[test]
    fn basename_strips_archive_path() {
        assert_eq!(basename("OEBPS/text/chapter01.xhtml"), "chapter01.xhtml");
        assert_eq!(basename("chapter01.xhtml"), "chapter01.xhtml");
    }

    #[test]
    fn is_markup_entry_is_case_insensitive() {
        assert!(is_markup_entry("Chapter.XHTML"));
        assert!(is_markup_entry("index.html"));
        assert!(!is_markup_entry("cover.jpg"));
    }
}
