//! Splits long text into chunks a translation engine will accept.

/// Split `text` into trimmed, non-empty chunks of at most `max_chars`
/// characters, breaking only between sentences.
///
/// Sentences are packed greedily. A sentence that is longer than `max_chars`
/// on its own is emitted as a single oversized chunk rather than cut.
pub fn segment(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences(text) {
        let sentence_len = sentence.chars().count();
        if current_len + sentence_len + 1 <= max_chars {
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(sentence);
            current_len += sentence_len;
        } else {
            push_chunk(&mut chunks, &current);
            current = sentence.to_string();
            current_len = sentence_len;
        }
    }
    push_chunk(&mut chunks, &current);

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}

/// Sentence-like units: a break follows `.`, `!` or `?` when whitespace comes
/// next. The whitespace run between two units is dropped.
fn sentences(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        let mut next_start = end;
        while let Some(&(j, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            next_start = j + w.len_utf8();
            chars.next();
        }
        if next_start > end {
            units.push(&text[start..end]);
            start = next_start;
        }
    }

    if start < text.len() {
        units.push(&text[start..]);
    }
    units.retain(|unit| !unit.is_empty());
    units
}
