//! Barcode scanner input.
//!
//! Scanners type a barcode as a fast burst of keystrokes followed by Enter.
//! The buffer assembles those keystrokes and drops anything typed too
//! slowly to be a scan.

use std::time::{Duration, Instant};

/// Longest pause between two keystrokes of the same scan.
pub const DEFAULT_SCAN_GAP: Duration = Duration::from_millis(50);

/// One keystroke as reported by the input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanKey {
    Char(char),
    Enter,
    Escape,
    /// Any other named key (Shift, Tab, F1 ...). Ignored.
    Named(String),
}

impl ScanKey {
    /// Maps a key name as reported by keyboard events: single characters
    /// become `Char`, `"Enter"` and `"Escape"` their variants.
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::Char(c),
            _ => match name {
                "Enter" => Self::Enter,
                "Escape" | "Esc" => Self::Escape,
                other => Self::Named(other.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanBuffer {
    buf: String,
    last_key: Option<Instant>,
    gap: Duration,
}

impl Default for ScanBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_GAP)
    }
}

impl ScanBuffer {
    pub fn new(gap: Duration) -> Self {
        Self {
            buf: String::new(),
            last_key: None,
            gap,
        }
    }

    /// Text collected since the last submit or reset.
    pub fn pending(&self) -> &str {
        &self.buf
    }

    /// Feeds one keystroke received at `at`.
    ///
    /// Returns the completed scan when `key` is Enter and the buffer holds
    /// non-blank text.
    pub fn push_key(&mut self, key: ScanKey, at: Instant) -> Option<String> {
        if let Some(last) = self.last_key
            && at.saturating_duration_since(last) > self.gap
        {
            self.buf.clear();
        }
        self.last_key = Some(at);

        match key {
            ScanKey::Char(c) => {
                self.buf.push(c);
                None
            }
            ScanKey::Enter => {
                let scan = std::mem::take(&mut self.buf);
                let scan = scan.trim();
                (!scan.is_empty()).then(|| scan.to_string())
            }
            ScanKey::Escape => {
                self.buf.clear();
                None
            }
            ScanKey::Named(_) => None,
        }
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.last_key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_burst(buffer: &mut ScanBuffer, text: &str, start: Instant) -> (Option<String>, Instant) {
        let mut at = start;
        for c in text.chars() {
            buffer.push_key(ScanKey::Char(c), at);
            at += Duration::from_millis(5);
        }
        (buffer.push_key(ScanKey::Enter, at), at)
    }

    #[test]
    fn fast_burst_submits_on_enter() {
        let mut buffer = ScanBuffer::default();
        let (scan, _) = type_burst(&mut buffer, "4801234", Instant::now());
        assert_eq!(scan.as_deref(), Some("4801234"));
        assert_eq!(buffer.pending(), "");
    }

    #[test]
    fn slow_keystrokes_restart_the_buffer() {
        let mut buffer = ScanBuffer::default();
        let start = Instant::now();
        buffer.push_key(ScanKey::Char('x'), start);
        buffer.push_key(ScanKey::Char('y'), start + Duration::from_millis(10));

        let (scan, _) = type_burst(&mut buffer, "123", start + Duration::from_millis(500));
        assert_eq!(scan.as_deref(), Some("123"));
    }

    #[test]
    fn escape_and_named_keys() {
        let mut buffer = ScanBuffer::default();
        let start = Instant::now();
        buffer.push_key(ScanKey::from_name("9"), start);
        buffer.push_key(ScanKey::from_name("Shift"), start);
        assert_eq!(buffer.pending(), "9");

        buffer.push_key(ScanKey::from_name("Escape"), start);
        assert_eq!(buffer.pending(), "");
    }

    #[test]
    fn blank_scan_is_not_submitted() {
        let mut buffer = ScanBuffer::default();
        let (scan, _) = type_burst(&mut buffer, "   ", Instant::now());
        assert_eq!(scan, None);
        assert_eq!(buffer.push_key(ScanKey::Enter, Instant::now()), None);
    }

    #[test]
    fn key_names_map_to_variants() {
        assert_eq!(ScanKey::from_name("a"), ScanKey::Char('a'));
        assert_eq!(ScanKey::from_name("Enter"), ScanKey::Enter);
        assert_eq!(ScanKey::from_name("Esc"), ScanKey::Escape);
        assert_eq!(
            ScanKey::from_name("ArrowUp"),
            ScanKey::Named("ArrowUp".to_string())
        );
    }
}
