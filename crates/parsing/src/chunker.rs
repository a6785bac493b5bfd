const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', ';', '。', '！', '？', '；', '．'];

/// Target size / overlap for the semantic chunker, in Unicode code
/// points (spec.md §4.E: "character counts use Unicode code points, not
/// bytes").
#[derive(Clone, Copy, Debug)]
pub struct ChunkerConfig {
    pub target_size: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { target_size: 1200, overlap: 200 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Unit {
    text: String,
    paragraph: usize,
}

impl Unit {
    fn len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits normalized text into paragraphs, sentences, and emits
/// target-sized overlapping chunks, per spec.md §4.E's semantic chunker.
/// Idempotent on already-chunked input of the same config: re-chunking a
/// chunk's own text with the same `target_size`/`overlap` reproduces it
/// (assuming it was itself under `target_size`).
pub fn chunk(text: &str, config: ChunkerConfig) -> Vec<String> {
    let paragraphs = split_paragraphs(text);
    let units = paragraphs
        .iter()
        .enumerate()
        .flat_map(|(para_idx, para)| split_sentences(para, config.target_size).into_iter().map(move |s| Unit { text: s, paragraph: para_idx }))
        .collect::<Vec<_>>();

    accumulate(&units, config)
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs
}

fn split_sentences(paragraph: &str, target_size: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut buf = String::new();
    let chars: Vec<char> = paragraph.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        buf.push(c);
        if SENTENCE_TERMINATORS.contains(&c) {
            let next_is_terminator = chars.get(i + 1).is_some_and(|n| SENTENCE_TERMINATORS.contains(n));
            if !next_is_terminator {
                let trimmed = buf.trim().to_string();
                if !trimmed.is_empty() {
                    sentences.push(trimmed);
                }
                buf.clear();
            }
        }
        i += 1;
    }
    let trimmed = buf.trim().to_string();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }

    sentences.into_iter().flat_map(|s| hard_split(s, target_size)).collect()
}

fn hard_split(sentence: String, target_size: usize) -> Vec<String> {
    if target_size == 0 || sentence.chars().count() <= target_size {
        return vec![sentence];
    }
    let chars: Vec<char> = sentence.chars().collect();
    chars.chunks(target_size).map(|slice| slice.iter().collect()).collect()
}

fn accumulate(units: &[Unit], config: ChunkerConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<Unit> = Vec::new();
    let mut current_len = 0usize;

    let mut i = 0;
    while i < units.len() {
        let unit = &units[i];
        let cost = separator_cost(&current, unit);
        let projected = current_len + cost + unit.len();

        if !current.is_empty() && projected > config.target_size {
            chunks.push(render(&current));
            let overlap_units = overlap_window(&current, config.overlap);

            let overlap_len: usize = rendered_len(&overlap_units);
            let reentry_cost = separator_cost(&overlap_units, unit);
            if overlap_len + reentry_cost + unit.len() <= config.target_size {
                current = overlap_units;
                current_len = overlap_len;
                let cost = separator_cost(&current, unit);
                current.push(unit.clone());
                current_len += cost + unit.len();
            } else {
                current = vec![unit.clone()];
                current_len = unit.len();
            }
        } else {
            current.push(unit.clone());
            current_len = projected;
        }
        i += 1;
    }

    if !current.is_empty() {
        chunks.push(render(&current));
    }
    chunks
}

fn separator_cost(current: &[Unit], next: &Unit) -> usize {
    match current.last() {
        None => 0,
        Some(last) if last.paragraph != next.paragraph => 2,
        Some(_) => 1,
    }
}

fn rendered_len(units: &[Unit]) -> usize {
    let mut len = 0;
    for (i, u) in units.iter().enumerate() {
        if i > 0 {
            len += if units[i - 1].paragraph != u.paragraph { 2 } else { 1 };
        }
        len += u.len();
    }
    len
}

/// The trailing window of `current` whose cumulative rune length is at
/// least `overlap`, per spec.md §4.E step 5.
fn overlap_window(current: &[Unit], overlap: usize) -> Vec<Unit> {
    if overlap == 0 {
        return Vec::new();
    }
    let mut window = Vec::new();
    let mut len = 0usize;
    for unit in current.iter().rev() {
        window.push(unit.clone());
        len += unit.len();
        if len >= overlap {
            break;
        }
    }
    window.reverse();
    window
}

fn render(units: &[Unit]) -> String {
    let mut out = String::new();
    for (i, unit) in units.iter().enumerate() {
        if i > 0 {
            if units[i - 1].paragraph != unit.paragraph {
                out.push_str("\n\n");
            } else {
                out.push(' ');
            }
        }
        out.push_str(&unit.text);
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_short_paragraph_is_one_chunk() {
        let chunks = chunk("This is one sentence. This is another.", ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "This is one sentence. This is another.");
    }

    #[test]
    fn oversized_sentence_is_hard_split() {
        let long = "a".repeat(30);
        let config = ChunkerConfig { target_size: 10, overlap: 0 };
        let chunks = chunk(&long, config);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.iter().map(|c| c.chars().count()).sum::<usize>(), 30);
    }

    #[test]
    fn splits_on_cjk_terminators() {
        let text = "第一句。第二句！第三句？";
        let sentences = split_sentences(text, 1000);
        assert_eq!(sentences, vec!["第一句。", "第二句！", "第三句？"]);
    }

    #[test]
    fn paragraph_boundaries_cost_more_than_sentence_boundaries() {
        let units = vec![
            Unit { text: "a".repeat(5), paragraph: 0 },
            Unit { text: "b".repeat(5), paragraph: 0 },
        ];
        let cost_within = separator_cost(&units[..1], &units[1]);
        assert_eq!(cost_within, 1);

        let cross = Unit { text: "c".repeat(5), paragraph: 1 };
        let cost_across = separator_cost(&units[..1], &cross);
        assert_eq!(cost_across, 2);
    }

    #[test]
    fn large_text_produces_overlapping_chunks() {
        let paragraph: String = (0..50).map(|n| format!("Sentence number {n} here.")).collect::<Vec<_>>().join(" ");
        let config = ChunkerConfig { target_size: 120, overlap: 30 };
        let chunks = chunk(&paragraph, config);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= config.target_size + 1, "chunk exceeded target size: {}", c.len());
        }
    }

    #[test]
    fn multiple_paragraphs_join_chunk_text_with_blank_line() {
        let text = "Para one sentence.\n\nPara two sentence.";
        let chunks = chunk(text, ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Para one sentence.\n\nPara two sentence.");
    }
}
