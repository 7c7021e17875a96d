//! FAQ text chunking.
//!
//! A chunk is a run of lines delimited by one or more blank lines, where a
//! blank line contains nothing but whitespace.

/// Splits raw FAQ text into trimmed, non-empty chunks in source order.
pub fn split_into_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_chunk(&mut current, &mut chunks);
        } else {
            current.push(line);
        }
    }
    flush_chunk(&mut current, &mut chunks);

    chunks
}

fn flush_chunk(lines: &mut Vec<&str>, chunks: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join("\n");
    lines.clear();

    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
