/// Split text into batches that respect sentence boundaries, each at most
/// `max_len` bytes. Providers cap the text accepted per request, so long
/// articles are synthesized in pieces and the audio is merged in order.
pub(crate) fn split_into_batches(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut batches = Vec::new();
    let mut current_batch = String::new();

    // Split on sentence-ending punctuation
    let sentence_pattern = regex::Regex::new(r"([.!?]+\s+)").unwrap();
    let mut last_end = 0;

    for mat in sentence_pattern.find_iter(text) {
        let sentence = &text[last_end..mat.end()];

        // If adding this sentence would exceed the limit, save current batch
        if !current_batch.is_empty() && current_batch.len() + sentence.len() > max_len {
            batches.push(current_batch.trim().to_string());
            current_batch = String::new();
        }

        current_batch.push_str(sentence);
        last_end = mat.end();
    }

    // Handle remaining text after last sentence boundary
    if last_end < text.len() {
        let remaining = &text[last_end..];

        if !current_batch.is_empty() && current_batch.len() + remaining.len() > max_len {
            batches.push(current_batch.trim().to_string());
            current_batch = String::new();
        }

        // If remaining text itself is too large, split it by characters
        if remaining.len() > max_len {
            let chars: Vec<char> = remaining.chars().collect();
            for chunk in chars.chunks(max_len) {
                batches.push(chunk.iter().collect());
            }
        } else {
            current_batch.push_str(remaining);
        }
    }

    if !current_batch.is_empty() {
        batches.push(current_batch.trim().to_string());
    }

    batches
}
