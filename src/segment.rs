use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Splits `text` into trimmed paragraph blocks, collapsing internal
/// whitespace runs to single spaces. Blocks that are empty after trimming
/// are dropped.
pub fn paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .filter_map(|block| {
            let block = block.trim();
            if block.is_empty() {
                None
            } else {
                Some(WHITESPACE_RUN.replace_all(block, " ").into_owned())
            }
        })
        .collect()
}
