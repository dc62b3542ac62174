use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Terminal columns occupied by `s` (CJK and emoji count double).
fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` so it fits in `max_width` columns, ending in "..." when shortened.
///
/// Widths too narrow for a character plus the ellipsis get a bare prefix.
/// Returns borrowed when `s` already fits.
///
/// ```
/// use folio::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Zero Trust Networks", 12), "Zero Trus...");
/// assert_eq!(truncate_to_width("Recon", 10), "Recon");
/// assert_eq!(truncate_to_width("Recon", 2), "Re");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    let room_for_ellipsis = max_width > ELLIPSIS.len();
    let budget = if room_for_ellipsis {
        max_width - ELLIPSIS.len()
    } else {
        max_width
    };

    let cut = prefix_within(s, budget);
    if room_for_ellipsis {
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    } else {
        Cow::Owned(s[..cut].to_string())
    }
}

/// Byte length of the longest prefix of `s` that fits in `budget` columns.
fn prefix_within(s: &str, budget: usize) -> usize {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            return idx;
        }
        used += w;
    }
    s.len()
}

fn is_stripped_control(c: char) -> bool {
    c == '\u{7f}' || (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Remove terminal control characters and ANSI escape sequences from remote text.
///
/// Article bodies and repository descriptions come from the network and are
/// drawn straight into the terminal. CSI (`ESC [ ... final`) and OSC
/// (`ESC ] ... BEL` or `ESC ] ... ESC \`) sequences are dropped whole; tab,
/// newline and carriage return survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            if !is_stripped_control(c) {
                out.push(c);
            }
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                // Parameter bytes run until the final byte in '@'..='~'.
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\u{07}' {
                        break;
                    }
                    if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    Cow::Owned(out)
}
