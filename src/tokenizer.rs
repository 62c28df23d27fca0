//! Quote-aware field splitting for delimited text lines.
//!
//! This module converts one physical line into an ordered sequence of
//! unescaped field strings. It has no knowledge of headers, types, or
//! records.
//!
//! Quoting follows a deliberate simplification rather than full RFC 4180:
//! the scanner toggles an in-quotes flag on every quote character, so a
//! doubled quote inside quoted text toggles twice and survives to the
//! unescape step, which collapses it to a single quote. A field that is not
//! fully wrapped in quotes is returned verbatim, so malformed quoting
//! (an unterminated or embedded unescaped quote) degrades to literal text
//! instead of raising an error.

const QUOTE: char = '"';
const ESCAPED_QUOTE: &str = "\"\"";

/// Split one line into unescaped fields on the given delimiter.
///
/// The field count always equals the number of unquoted delimiters plus one:
/// a line ending in a delimiter yields a trailing empty field.
pub fn tokenize(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let delimiter_len = delimiter.len_utf8();

    // Byte offset of the most recent unquoted delimiter, if any.
    let mut last: Option<usize> = None;
    let mut in_quoted_span = false;

    for (index, ch) in line.char_indices() {
        if ch == QUOTE {
            in_quoted_span = !in_quoted_span;
        } else if ch == delimiter && !in_quoted_span {
            let start = last.map_or(0, |l| l + delimiter_len);
            let raw = line[start..index + delimiter_len].trim_matches(delimiter);
            fields.push(unescape(raw));
            last = Some(index);
        }
    }

    // Trailing field, empty when the line ends exactly on a delimiter.
    let start = last.map_or(0, |l| l + delimiter_len);
    fields.push(unescape(&line[start..]));

    fields
}

/// Encode a field for writing: double embedded quotes, then wrap the field
/// in quotes if it contains the delimiter, a quote, or a newline.
pub fn escape(field: &str, delimiter: char) -> String {
    let mut encoded = if field.contains(QUOTE) {
        field.replace(QUOTE, ESCAPED_QUOTE)
    } else {
        field.to_string()
    };

    if encoded.contains(delimiter) || encoded.contains(QUOTE) || encoded.contains('\n') {
        encoded = format!("{QUOTE}{encoded}{QUOTE}");
    }

    encoded
}

/// Decode a raw field slice: strip a matching leading and trailing quote
/// pair and collapse doubled quotes inside it. Fields not fully wrapped in
/// quotes are returned verbatim.
pub fn unescape(field: &str) -> String {
    if field.len() >= 2 && field.starts_with(QUOTE) && field.ends_with(QUOTE) {
        let inner = &field[QUOTE.len_utf8()..field.len() - QUOTE.len_utf8()];
        if inner.contains(ESCAPED_QUOTE) {
            inner.replace(ESCAPED_QUOTE, "\"")
        } else {
            inner.to_string()
        }
    } else {
        field.to_string()
    }
}
