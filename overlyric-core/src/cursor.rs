//! Mapping an estimated playback position onto the current lyric line.

use crate::lrc::LyricsLine;

/// Default forward bias applied to the estimated position before line
/// lookup, compensating for network and render latency so the displayed
/// line lands on the beat rather than trailing it.
pub const DEFAULT_LEAD_OFFSET_SECS: f64 = 0.5;

/// Tracks which line is current as the estimated position advances.
///
/// Precondition: the line slice handed to [`LyricsCursor::advance`] is
/// sorted non-decreasing by `offset_seconds`. The parser preserves source
/// order, so callers feeding unsorted documents get unspecified indices.
#[derive(Debug, Clone)]
pub struct LyricsCursor {
    current: Option<usize>,
    lead_offset: f64,
}

impl Default for LyricsCursor {
    fn default() -> Self {
        Self::new(DEFAULT_LEAD_OFFSET_SECS)
    }
}

impl LyricsCursor {
    #[must_use]
    pub const fn new(lead_offset_seconds: f64) -> Self {
        Self {
            current: None,
            lead_offset: lead_offset_seconds,
        }
    }

    /// The line index last computed by [`LyricsCursor::advance`], `None`
    /// while the position is still before the first line.
    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    /// Force the cursor back to "before the first line". Must happen on
    /// every track change so a first line at offset zero is reported as a
    /// transition.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Recompute the current line for `estimated_position` and report
    /// whether it moved.
    ///
    /// The scan walks forward and stops at the first line beyond the biased
    /// position; with sorted input that makes the pass cheap, but the result
    /// does not depend on the early exit.
    pub fn advance(
        &mut self,
        lines: &[LyricsLine],
        estimated_position: f64,
    ) -> (Option<usize>, bool) {
        let threshold = estimated_position + self.lead_offset;
        let mut next = None;
        for (i, line) in lines.iter().enumerate() {
            if line.offset_seconds <= threshold {
                next = Some(i);
            } else {
                break;
            }
        }
        let changed = next != self.current;
        self.current = next;
        (next, changed)
    }
}
