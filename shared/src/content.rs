//! Body text helpers: Markdown rendering, HTML sanitizing and plain-text
//! extraction for excerpts.

use pulldown_cmark::{html, Options, Parser};
use serde_json::Value;

/// Length of generated excerpts, in characters.
pub const EXCERPT_CHARS: usize = 180;

/// Renders Markdown to HTML and sanitizes the result.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);

    let parser = Parser::new_ext(markdown, options);
    let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut rendered, parser);
    sanitize_html(&rendered)
}

/// Removes scripts, event handlers and anything else outside the default
/// allow-list.
pub fn sanitize_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Drops markup from an HTML fragment and collapses whitespace.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            },
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {},
        }
    }
    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    collapse_whitespace(&decoded)
}

/// Concatenates the text spans of portable-text style blocks.
pub fn blocks_text(blocks: &[Value]) -> String {
    let paragraphs: Vec<String> = blocks
        .iter()
        .filter_map(|block| block.get("children").and_then(Value::as_array))
        .map(|children| {
            children
                .iter()
                .filter_map(|span| span.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .collect();
    collapse_whitespace(&paragraphs.join(" "))
}

/// Cuts `text` at a word boundary no longer than `max_chars`, adding an
/// ellipsis when shortened.
pub fn excerpt_from(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end_matches(|c: char| c.is_ascii_punctuation()))
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
