/// Applies the normalization pass spec.md §4.E requires uniformly across
/// every pipeline before chunking: CRLF→LF, tabs→space, NUL/zero-width/
/// soft-hyphen stripping, NBSP→space, other control-char stripping
/// (newline kept), whitespace collapse within a line, per-line trim, and
/// blank-line preservation as paragraph separators.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(input: &str) -> String {
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines_out = Vec::new();
    for line in unified.split('\n') {
        lines_out.push(normalize_line(line));
    }
    lines_out.join("\n")
}

fn normalize_line(line: &str) -> String {
    let mut cleaned = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '\t' => cleaned.push(' '),
            '\0' => {}
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{2060}' | '\u{00AD}' => {}
            '\u{00A0}' => cleaned.push(' '),
            c if c.is_control() => {}
            c => cleaned.push(c),
        }
    }

    let collapsed: String = collapse_whitespace_runs(&cleaned);
    collapsed.trim().to_string()
}

fn collapse_whitespace_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for ch in s.chars() {
        if ch == ' ' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_crlf_and_lone_cr_to_lf() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn strips_nuls_zero_width_and_soft_hyphen() {
        let input = "hy\u{00AD}phen\u{200B}\u{FEFF}\0ated";
        assert_eq!(normalize(input), "hyphenated");
    }

    #[test]
    fn nbsp_becomes_a_regular_space() {
        assert_eq!(normalize("a\u{00A0}b"), "a b");
    }

    #[test]
    fn collapses_whitespace_runs_and_trims_each_line() {
        assert_eq!(normalize("  a   b  \n  c  "), "a b\nc");
    }

    #[test]
    fn preserves_blank_lines_as_paragraph_separators() {
        assert_eq!(normalize("para one\n\npara two"), "para one\n\npara two");
    }

    #[test]
    fn is_idempotent() {
        let input = "  mixed\t\ttabs\r\nand\u{00A0}nbsp\r  \n\n line  ";
        let once = normalize(input);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }
}
