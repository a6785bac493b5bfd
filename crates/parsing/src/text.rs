/// Plain-text pipeline: spec.md §4.E just says "read, normalize, chunk" —
/// no extraction step exists because there's nothing to extract from.
pub fn read_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
