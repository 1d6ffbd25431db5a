//! Scoring module - line clear points and level progression
//!
//! Clearing `n` lines in a single lock awards `LINE_SCORES[n] * level`, using the level in
//! effect before the clear. The level is recomputed from the cumulative line count after
//! every clear: `level = lines / 10 + 1`.

use crate::types::{DROP_INTERVALS, LINES_PER_LEVEL, LINE_SCORES};

/// Score calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// Points awarded for this clear.
    pub points: u32,
    /// Cumulative lines after the clear.
    pub total_lines: u32,
    /// Level after the clear.
    pub level: u32,
    pub leveled_up: bool,
}

/// Calculate line clear score
/// lines: number of lines cleared (1-4)
/// level: current level (1-based)
pub fn line_clear_score(lines: usize, level: u32) -> u32 {
    if lines == 0 || lines > 4 {
        return 0;
    }
    LINE_SCORES[lines].saturating_mul(level)
}

/// Level for a cumulative line count.
pub fn level_for_lines(total_lines: u32) -> u32 {
    total_lines / LINES_PER_LEVEL + 1
}

/// Automatic drop interval for a level, clamped to the last table entry.
pub fn drop_interval_ms(level: u32) -> u32 {
    let idx = (level.max(1) - 1) as usize;
    DROP_INTERVALS[idx.min(DROP_INTERVALS.len() - 1)]
}

/// Score a single lock that removed `cleared` rows.
pub fn calculate_score(cleared: usize, level: u32, total_lines: u32) -> ScoreResult {
    let points = line_clear_score(cleared, level);
    let total_lines = total_lines + cleared as u32;
    let new_level = level_for_lines(total_lines);
    ScoreResult {
        points,
        total_lines,
        level: new_level,
        leveled_up: new_level > level,
    }
}
