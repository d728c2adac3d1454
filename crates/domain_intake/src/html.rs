//! HTML body to plain text

use once_cell::sync::Lazy;
use regex::Regex;

static HIDDEN_BLOCKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style|head)\b.*?</(script|style|head)\s*>").expect("valid regex"));
static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</(p|div|tr|li|h[1-6]|table)\s*>").expect("valid regex"));
static CELL_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</t[dh]\s*>").expect("valid regex"));
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t\u{a0}]").expect("valid regex"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Decodes the handful of entities mail clients emit
fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
        .replace("&amp;", "&")
}

/// Strips markup from an HTML body, keeping line structure
///
/// Block-level closing tags become newlines and table cells become
/// double spaces so that `Label: value` rows from tabular mails stay
/// on one line and remain matchable.
pub fn strip_html(html: &str) -> String {
    let text = HIDDEN_BLOCKS.replace_all(html, "");
    let text = LINE_BREAKS.replace_all(&text, "\n");
    let text = CELL_BREAKS.replace_all(&text, "  ");
    let text = TAGS.replace_all(&text, "");
    let text = decode_entities(&text);

    let lines: Vec<String> = text
        .lines()
        .map(|line| SPACES.replace_all(line.trim(), " ").into_owned())
        .collect();
    BLANK_LINES.replace_all(lines.join("\n").trim(), "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_keeps_lines() {
        let html = "<html><head><style>p { color: red; }</style></head><body>\
                    <p>Claim No: 12345</p><p>Insured Name: Ravi Kumar</p></body></html>";
        assert_eq!(strip_html(html), "Claim No: 12345\nInsured Name: Ravi Kumar");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(strip_html("A&nbsp;&amp;&nbsp;B&lt;C&gt;"), "A & B<C>");
    }

    #[test]
    fn test_br_becomes_newline() {
        assert_eq!(strip_html("one<br>two<BR/>three"), "one\ntwo\nthree");
    }

    #[test]
    fn test_scripts_removed() {
        assert_eq!(strip_html("<script>alert('x')</script>hello"), "hello");
    }
}
