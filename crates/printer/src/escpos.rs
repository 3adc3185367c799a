//! ESC/POS command builder
//!
//! Builds the byte stream sent to thermal printers.

/// Lines fed before the cut so the last text clears the cutter.
pub const FEED_BEFORE_CUT: u8 = 4;

/// ESC/POS command builder
pub struct EscPosBuilder {
    buf: Vec<u8>,
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EscPosBuilder {
    /// Creates a builder that starts by initializing the printer.
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(1024);
        // ESC @
        buf.extend_from_slice(&[0x1B, 0x40]);
        Self { buf }
    }

    /// Write raw text
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Print and feed `lines` lines
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        // ESC d n
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    /// Cut paper (full cut)
    pub fn cut(&mut self) -> &mut Self {
        // GS V 0
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x00]);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    /// A complete job for one receipt: init, text, feed, full cut.
    pub fn receipt_job(text: &str) -> Vec<u8> {
        let mut builder = Self::new();
        builder.text(text).feed(FEED_BEFORE_CUT).cut();
        builder.build()
    }
}
