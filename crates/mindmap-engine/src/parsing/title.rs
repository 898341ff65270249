//! Escaping of topic titles on the `#` line.

use std::sync::OnceLock;

use regex::Regex;

fn line_break_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)<\s*br\s*/?\s*>").expect("Invalid line break regex"))
}

/// Title text as stored in the model.
pub fn unescape_title(text: &str) -> String {
    let text = line_break_regex().replace_all(text, "\n").replace("\\#", "#");
    normalize_line_breaks(text)
}

/// Title text as written after the hash run.
pub fn escape_title(text: &str) -> String {
    normalize_line_breaks(text.replace('#', "\\#")).replace('\n', "<br/>")
}

/// Titles keep line breaks as `\n` only, so `\r\n` and a lone `\r` become `\n`.
pub fn normalize_line_breaks(text: impl Into<String>) -> String {
    let text = text.into();
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(r"C\# tips", "C# tips")]
    #[case("one<br/>two", "one\ntwo")]
    #[case("one<BR>two< br />three", "one\ntwo\nthree")]
    #[case("  spaced  ", "  spaced  ")]
    fn unescapes(#[case] written: &str, #[case] title: &str) {
        assert_eq!(unescape_title(written), title);
    }

    #[rstest]
    #[case("C# tips")]
    #[case("multi\nline")]
    #[case(r"back\slash \# literal")]
    #[case("## heading like")]
    #[case("carriage\nreturn\n")]
    fn escaped_titles_read_back(#[case] title: &str) {
        assert_eq!(unescape_title(&escape_title(title)), title);
    }

    #[test]
    fn escaped_title_has_no_line_breaks() {
        assert_eq!(escape_title("a\r\nb\nc#\rd"), r"a<br/>b<br/>c\#<br/>d");
    }

    #[rstest]
    #[case::cr_before_break("a\r<br/>b", "a\nb")]
    #[case::lone_cr("a\rb", "a\nb")]
    #[case::trailing_cr("a\r", "a\n")]
    fn carriage_returns_become_line_breaks(#[case] written: &str, #[case] title: &str) {
        assert_eq!(unescape_title(written), title);
        assert_eq!(unescape_title(&escape_title(title)), title);
    }
}
