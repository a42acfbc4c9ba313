//! ESC/POS command builder
//!
//! Text is encoded to Windows-1252 as it is written, so command bytes and
//! text bytes never need to be told apart afterwards.

use crate::encoding::{encode_cp1252, text_width, truncate_text};

/// ESC t 16: select character code table WPC1252
const SELECT_CP1252: [u8; 3] = [0x1B, 0x74, 16];

/// ESC/POS command builder
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(2048);
        // Initialize printer (ESC @)
        buf.extend_from_slice(&[0x1B, 0x40]);
        buf.extend_from_slice(&SELECT_CP1252);
        Self { buf, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&encode_cp1252(s));
        self
    }

    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    /// Print and feed n lines (ESC d n)
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    /// Write text wrapped at the paper width, continuation lines indented
    pub fn wrapped(&mut self, s: &str, indent: usize) -> &mut Self {
        let width = self.width.max(indent + 1);
        let mut first = true;
        let mut current = String::new();
        for word in s.split_whitespace() {
            let limit = if first { width } else { width - indent };
            let extra = usize::from(!current.is_empty());
            if !current.is_empty() && text_width(&current) + extra + text_width(word) > limit {
                self.emit_wrapped(&current, first, indent);
                first = false;
                current.clear();
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            self.emit_wrapped(&current, first, indent);
        }
        self
    }

    fn emit_wrapped(&mut self, chunk: &str, first: bool, indent: usize) {
        if first {
            let chunk = truncate_text(chunk, self.width);
            self.line(&chunk);
        } else {
            let chunk = truncate_text(chunk, self.width - indent);
            let padded = format!("{}{}", " ".repeat(indent), chunk);
            self.line(&padded);
        }
    }

    // === Alignment ===

    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    /// Align text to left (default)
    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x00]);
        self
    }

    pub fn right(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x02]);
        self
    }

    // === Text Style ===

    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x11]);
        self
    }

    pub fn double_height(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x01]);
        self
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x00]);
        self
    }

    // === Separators ===

    pub fn sep_double(&mut self) -> &mut Self {
        self.line(&"=".repeat(self.width))
    }

    pub fn sep_single(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    /// Print left and right text on the same line
    ///
    /// If both do not fit, the left text is truncated so the right column
    /// (usually a price) stays intact.
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = text_width(left);
        let rw = text_width(right);

        if lw + rw < self.width {
            let spaces = self.width - lw - rw;
            self.text(left);
            self.text(&" ".repeat(spaces));
            self.line(right)
        } else if rw + 1 < self.width {
            let left = truncate_text(left, self.width - rw - 1);
            self.text(&left);
            self.text(" ");
            self.line(right)
        } else {
            self.line(left);
            self.line(right)
        }
    }

    // === Paper Control ===

    /// Cut paper (GS V 0, full cut)
    pub fn cut(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x00]);
        self
    }

    /// Full cut after feeding n lines (GS V 66 n)
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    // === Build ===

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}
