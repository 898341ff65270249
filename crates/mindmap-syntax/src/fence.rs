//! Encoding and decoding of `EXTRA_TEXT` blocks.
//!
//! Extra payloads and code snippets are stored in backtick fences. The fence
//! is always longer than any backtick run inside the content, and a reader
//! only accepts a closing run of exactly the opening length:
//!
//! `````text
//! - NOTE
//! ````
//! a note quoting ``` inline
//! ````
//! `````
//!
//! Older files may use `<pre>...</pre>` with HTML escaped content instead.

const PRE_OPEN: &str = "<pre>";
const PRE_CLOSE: &str = "</pre>";

/// Length of the longest run of backticks in `text`.
pub fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

/// Byte index of the first backtick run of exactly `len` in `text`.
pub fn find_backtick_run(text: &str, len: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] != b'`' {
            index += 1;
            continue;
        }
        let run = bytes[index..].iter().take_while(|b| **b == b'`').count();
        if run == len {
            return Some(index);
        }
        index += run;
    }
    None
}

/// Append `content` in a fence long enough that no run inside can close it.
///
/// `info` follows the opening fence on the same line; it is empty for extras
/// and holds the language for code snippets.
pub fn write_fenced(out: &mut String, info: &str, content: &str, min_fence: usize) {
    let fence = "`".repeat(min_fence.max(1).max(longest_backtick_run(content) + 1));
    out.push_str(&fence);
    out.push_str(info);
    out.push('\n');
    out.push_str(content);
    out.push('\n');
    out.push_str(&fence);
}

/// A fence split into its info string and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    pub info: &'a str,
    pub content: &'a str,
}

/// Split a complete fence token into info string and content.
///
/// The line break after the opening line and the one before the closing run
/// belong to the framing and are not part of the content. A fence without a
/// line break is taken as inline content with no info string.
pub fn split_fenced(text: &str) -> Option<FencedBlock<'_>> {
    let run = text.bytes().take_while(|b| *b == b'`').count();
    if run == 0 || text.len() < run * 2 || !text.ends_with(&"`".repeat(run)) {
        return None;
    }
    let inner = &text[run..text.len() - run];

    let Some(newline) = inner.find('\n') else {
        return Some(FencedBlock {
            info: "",
            content: inner,
        });
    };

    let opening_line = &inner[..newline];
    let crlf = opening_line.ends_with('\r');
    let info = opening_line.strip_suffix('\r').unwrap_or(opening_line).trim();

    let body = &inner[newline + 1..];
    let content = if crlf {
        body.strip_suffix("\r\n")
            .or_else(|| body.strip_suffix('\n'))
            .unwrap_or(body)
    } else {
        body.strip_suffix('\n').unwrap_or(body)
    };
    Some(FencedBlock { info, content })
}

/// Decode the payload of an `EXTRA_TEXT` token.
///
/// Returns `None` when the text is neither a fence nor a `<pre>` block.
pub fn decode_extra_text(text: &str) -> Option<String> {
    if text.starts_with('`') {
        return split_fenced(text).map(|block| block.content.to_string());
    }
    let inner = text.strip_prefix(PRE_OPEN)?.strip_suffix(PRE_CLOSE)?;
    Some(html_escape::decode_html_entities(inner).into_owned())
}
