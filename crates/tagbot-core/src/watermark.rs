//! The processed-event watermark.

use std::fmt;

/// Creation time of the newest event already processed, epoch seconds.
///
/// Only moves forward: [`Watermark::observe`] ignores older timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Watermark(f64);

impl Watermark {
    #[must_use]
    pub const fn new(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Parse the stored page text. Unreadable text counts as zero.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Self(v),
            _ => {
                if !text.trim().is_empty() {
                    tracing::warn!(text = text.trim(), "unreadable watermark; starting from zero");
                }
                Self(0.0)
            }
        }
    }

    #[must_use]
    pub const fn seconds(self) -> f64 {
        self.0
    }

    /// Whether an event created at `created` is newer than the watermark.
    #[must_use]
    pub fn admits(self, created: f64) -> bool {
        created > self.0
    }

    /// Advance to `created` if it is newer.
    pub fn observe(&mut self, created: f64) {
        if created > self.0 {
            self.0 = created;
        }
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_is_monotonic() {
        let mut mark = Watermark::default();
        for t in [10.0, 7.0, 15.0, 12.0] {
            mark.observe(t);
        }
        assert!((mark.seconds() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn admits_only_strictly_newer() {
        let mark = Watermark::new(10.0);
        assert!(!mark.admits(10.0));
        assert!(!mark.admits(9.5));
        assert!(mark.admits(10.5));
    }

    #[test]
    fn parse_accepts_float_text() {
        assert_eq!(Watermark::parse(" 1450000000.5\n"), Watermark::new(1_450_000_000.5));
        assert_eq!(Watermark::parse("garbage"), Watermark::default());
        assert_eq!(Watermark::parse(""), Watermark::default());
        assert_eq!(Watermark::parse("-3"), Watermark::default());
    }

    #[test]
    fn display_round_trips() {
        let mark = Watermark::new(1_450_000_123.25);
        assert_eq!(Watermark::parse(&mark.to_string()), mark);
        assert_eq!(Watermark::new(15.0).to_string(), "15");
    }
}
