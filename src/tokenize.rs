/// Splits on any run of whitespace; never yields empty tokens.
#[must_use]
pub fn tokenize(sentence: &str) -> Vec<String> {
    sentence.split_whitespace().map(str::to_string).collect()
}

#[must_use]
pub fn join_tokens(tokens: &[String]) -> String {
    tokens.join(" ")
}

/// First offset where `needle` appears contiguously in `haystack`.
#[must_use]
pub fn find_token_sequence(haystack: &[String], needle: &[String]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
