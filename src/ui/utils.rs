use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Cut `text` to at most `max_width` terminal columns, ending in an ellipsis
/// when anything was dropped
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let width = c.width().unwrap_or(0);
        if used + width > budget {
            break;
        }
        out.push(c);
        used += width;
    }
    out.push(ELLIPSIS);
    out
}

/// Replace control characters (tabs, stray carriage returns) with spaces so
/// a record always occupies exactly one terminal line
pub fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Left-align `text` in a column of `width`, truncating when it does not fit
pub fn pad_to_width(text: &str, width: usize) -> String {
    let text = truncate_with_ellipsis(text, width);
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}
