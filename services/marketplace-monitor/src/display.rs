//! Item formatting and the terminal sink
//!
//! Formatting is a pure function of the item and the supplied wall-clock
//! time. `ItemPrinter` owns the output stream and the zero-star filter.

use std::fmt::Display;
use std::io::Write;

use chrono::{DateTime, Local, TimeZone, Utc};
use marketplace::{Error, Item, Result};

const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const GRAY: &str = "\x1b[90m";
const RESET: &str = "\x1b[0m";

const ABSOLUTE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Coarse "time ago" for an offset in seconds. Future timestamps read as `0s ago`.
pub fn relative_time(offset_secs: i64) -> String {
    let secs = offset_secs.max(0);
    match secs {
        s if s < 60 => format!("{s}s ago"),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}

/// Unix seconds rendered in `tz`.
pub fn absolute_time_in<Tz>(ts: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match tz.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format(ABSOLUTE_FORMAT).to_string(),
        None => format!("@{ts}"),
    }
}

/// One display line for `item` as of `now`.
pub fn render_item(item: &Item, now: DateTime<Utc>) -> String {
    render_item_in(item, now, &Local)
}

fn render_item_in<Tz>(item: &Item, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let relative = relative_time(now.timestamp() - item.updated_at);
    let absolute = absolute_time_in(item.updated_at, tz);
    [
        format!("{CYAN}{}{RESET}", item.title),
        format!("Posted: {YELLOW}{relative}{RESET} {GRAY}({absolute}){RESET}"),
        format!("ID: {GRAY}{}{RESET}", item.id),
    ]
    .join(" | ")
}

pub fn separator(width: usize) -> String {
    "─".repeat(width)
}

/// What happened to a delivered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Printed,
    Filtered,
}

/// Writes surfaced items to a text stream.
pub struct ItemPrinter<W> {
    out: W,
    filter_zero_stars: bool,
    separator: String,
}

impl<W: Write> ItemPrinter<W> {
    pub fn new(out: W, filter_zero_stars: bool, separator_width: usize) -> Self {
        Self {
            out,
            filter_zero_stars,
            separator: separator(separator_width),
        }
    }

    /// Print `item`, or drop it when it has no rating and filtering is on.
    ///
    /// Write failures surface as `Error::Handler` and abort the current pass.
    pub fn handle(&mut self, item: &Item, now: DateTime<Utc>) -> Result<Delivery> {
        if self.filter_zero_stars && item.numeric_stars() == 0.0 {
            return Ok(Delivery::Filtered);
        }

        let line = render_item(item, now);
        writeln!(self.out, "{}", self.separator)
            .and_then(|_| writeln!(self.out, "{line}"))
            .and_then(|_| self.out.flush())
            .map_err(|e| Error::Handler(format!("failed to write item {}: {e}", item.id)))?;
        Ok(Delivery::Printed)
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }
}
