//! Multi-day plan text parser

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;
use tracing::debug;

use super::PlanCalendar;

/// Marks the start of a day block ("Day 1", "Day 2:" ...)
static DAY_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Day [0-9]+").expect("day marker pattern is valid"));

/// Split raw plan text into day blocks and lay them out from `start`
///
/// Every `Day <n>` occurrence starts a new block (marker included). Blocks
/// are trimmed; blank ones are dropped. Block `i` lands on `start + i` days:
/// the position decides the date, not the number printed in the marker.
/// Text with no marker becomes a single block on `start`.
pub fn parse_plan(raw: &str, start: NaiveDate) -> PlanCalendar {
    debug!(raw_len = raw.len(), %start, "parse_plan: called");

    let blocks = split_day_blocks(raw);
    debug!(block_count = blocks.len(), "parse_plan: split");

    let days = blocks.into_iter().enumerate().filter_map(|(index, block)| {
        let date = start.checked_add_days(Days::new(index as u64))?;
        Some((date, block.to_string()))
    });

    PlanCalendar::from_days(start, days)
}

fn split_day_blocks(raw: &str) -> Vec<&str> {
    let mut boundaries: Vec<usize> = DAY_MARKER.find_iter(raw).map(|m| m.start()).collect();
    if boundaries.first() != Some(&0) {
        boundaries.insert(0, 0);
    }
    boundaries.push(raw.len());

    boundaries
        .windows(2)
        .map(|pair| raw[pair[0]..pair[1]].trim())
        .filter(|block| !block.is_empty())
        .collect()
}
