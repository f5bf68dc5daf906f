//! Text helpers shared by the header extraction rules.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use unicode_normalization::UnicodeNormalization;

/// Visible text of an element with every text node trimmed and empty nodes
/// dropped, concatenated without separators.
pub(crate) fn stripped_text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Normalize a date cell: NFKD, drop zero-width/no-break spaces, trim.
///
/// NFKD runs first, so interior no-break spaces survive as plain U+0020.
pub(crate) fn clean_date_text(text: &str) -> String {
    static INVISIBLE_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[\x{200B}\x{202F}\x{00A0}]").expect("valid regex")
    });

    let normalized: String = text.nfkd().collect();
    INVISIBLE_SPACE_RE
        .replace_all(&normalized, "")
        .trim()
        .to_string()
}

/// Render a list of strings the way the downstream consumers expect it:
/// `['a', 'b']`, with per-item quoting that switches to double quotes when an
/// item contains a single quote but no double quote.
pub(crate) fn quoted_list(items: &[String]) -> String {
    let rendered: Vec<String> = items.iter().map(|item| quote_item(item)).collect();
    format!("[{}]", rendered.join(", "))
}

fn quote_item(item: &str) -> String {
    let quote = if item.contains('\'') && !item.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(item.len() + 2);
    out.push(quote);
    for ch in item.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
