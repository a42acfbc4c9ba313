//! Windows-1252 text encoding for thermal printers
//!
//! Western receipt printers render code page 1252 (WPC1252): one byte per
//! character, so display width equals the character count. Characters with
//! no 1252 mapping are printed as `?`.

/// Encode text as Windows-1252, replacing unmappable characters with `?`
pub fn encode_cp1252(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut buf = [0u8; 4];
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if had_errors || bytes.len() != 1 {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

/// Printed width of a string in columns
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to at most `max_width` columns
pub fn truncate_text(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to exactly `width` columns, truncating if longer
pub fn pad_text(s: &str, width: usize, align_right: bool) -> String {
    let current = text_width(s);
    if current >= width {
        return truncate_text(s, width);
    }
    let spaces = " ".repeat(width - current);
    if align_right {
        format!("{spaces}{s}")
    } else {
        format!("{s}{spaces}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_latin() {
        assert_eq!(encode_cp1252("abc"), b"abc");
        assert_eq!(encode_cp1252("é"), vec![0xE9]);
        assert_eq!(encode_cp1252("€5"), vec![0x80, b'5']);
    }

    #[test]
    fn test_encode_unmappable() {
        assert_eq!(encode_cp1252("a中b"), b"a?b");
        assert_eq!(encode_cp1252("🍕"), b"?");
    }

    #[test]
    fn test_width_and_padding() {
        assert_eq!(text_width("Crème brûlée"), 12);
        assert_eq!(truncate_text("hello world", 5), "hello");
        assert_eq!(pad_text("hi", 5, false), "hi   ");
        assert_eq!(pad_text("hi", 5, true), "   hi");
        assert_eq!(pad_text("hello world", 5, false), "hello");
    }
}
