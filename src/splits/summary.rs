//! Three-row split table derived from [`SplitState`].
//!
//! ```text
//! Best:  best S1 | best S2 | best S3 | best lap
//! Last:  last S1 | last S2 | last S3 | last lap   (sector being driven shows live time)
//! Delta: vs ref  | vs ref  | vs ref  | vs ref
//! ```
//!
//! A value equal to the current best is purple. Deltas are taken against the previous best
//! when the value is the best, so a new best shows how much was gained.

use std::fmt;

use super::{Millis, SplitState};

/// Colour used for purple cells in HTML output.
pub const PURPLE: &str = "#c084fc";
/// Colour used for ordinary highlighted cells in HTML output.
pub const NORMAL: &str = "white";

const MISSING: &str = "--.--";

/// Content of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryValue {
    Missing,
    Time(Millis),
    Delta(Millis),
}

/// How a cell is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// No colour markup
    Plain,
    Normal,
    /// Equal to the session best
    Purple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryCell {
    pub value: SummaryValue,
    pub style: CellStyle,
}

impl SummaryCell {
    fn plain(value: SummaryValue) -> Self {
        Self { value, style: CellStyle::Plain }
    }

    fn time(time: Option<Millis>, style: CellStyle) -> Self {
        match time {
            Some(t) => Self { value: SummaryValue::Time(t), style },
            None => Self::plain(SummaryValue::Missing),
        }
    }

    pub fn is_purple(&self) -> bool {
        self.style == CellStyle::Purple
    }

    /// The cell wrapped in a coloured span where it has a style.
    pub fn to_html(&self) -> String {
        let color = match (self.value, self.style) {
            (SummaryValue::Missing, _) | (_, CellStyle::Plain) => return self.to_string(),
            (_, CellStyle::Normal) => NORMAL,
            (_, CellStyle::Purple) => PURPLE,
        };
        format!(r#"<span style="color:{}">{}</span>"#, color, self)
    }
}

impl fmt::Display for SummaryCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            SummaryValue::Missing => f.write_str(MISSING),
            SummaryValue::Time(t) => write!(f, "{}", seconds(t)),
            SummaryValue::Delta(d) => {
                let sign = if d >= 0 { '+' } else { '-' };
                write!(f, "{}{}", sign, seconds(d.abs()))
            }
        }
    }
}

/// Milliseconds as seconds with three decimals.
fn seconds(millis: Millis) -> String {
    format!("{:.3}", millis as f64 / 1000.0)
}

/// A labelled row of three sector cells and a lap cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub label: &'static str,
    pub cells: [SummaryCell; 4],
}

impl SummaryRow {
    pub fn sectors(&self) -> &[SummaryCell] {
        &self.cells[..3]
    }

    pub fn lap(&self) -> &SummaryCell {
        &self.cells[3]
    }

    pub fn to_html(&self) -> String {
        let cells: Vec<String> = self.cells.iter().map(SummaryCell::to_html).collect();
        format!("{}: {}", self.label, cells.join(" | "))
    }
}

impl fmt::Display for SummaryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.label)?;
        for (i, cell) in self.cells.iter().enumerate() {
            let separator = if i == 0 { " " } else { " | " };
            write!(f, "{}{}", separator, cell)?;
        }
        Ok(())
    }
}

/// Best, last and delta rows for one moment of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    pub best: SummaryRow,
    pub last: SummaryRow,
    pub delta: SummaryRow,
}

impl SplitSummary {
    pub fn from_state(state: &SplitState) -> Self {
        Self { best: best_row(state), last: last_row(state), delta: delta_row(state) }
    }

    pub fn rows(&self) -> [&SummaryRow; 3] {
        [&self.best, &self.last, &self.delta]
    }

    /// Rows with colour spans, separated by `<br>`.
    pub fn to_html(&self) -> String {
        let rows: Vec<String> = self.rows().iter().map(|row| row.to_html()).collect();
        rows.join("<br>")
    }
}

impl fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.best, self.last, self.delta)
    }
}

fn best_row(state: &SplitState) -> SummaryRow {
    let value = |t: Option<Millis>| t.map_or(SummaryValue::Missing, SummaryValue::Time);
    SummaryRow {
        label: "Best",
        cells: [
            SummaryCell::plain(value(state.best_times[0])),
            SummaryCell::plain(value(state.best_times[1])),
            SummaryCell::plain(value(state.best_times[2])),
            SummaryCell::plain(value(state.best_lap_time)),
        ],
    }
}

fn last_row(state: &SplitState) -> SummaryRow {
    let live = state.live_sector_time();
    let sector = |i: usize| match live {
        Some(elapsed) if i == state.current_sector.index() => {
            SummaryCell::time(Some(elapsed), CellStyle::Normal)
        }
        _ => highlighted(state, state.split_times[i], state.best_times[i]),
    };

    SummaryRow {
        label: "Last",
        cells: [
            sector(0),
            sector(1),
            sector(2),
            highlighted(state, state.last_lap_time, state.best_lap_time),
        ],
    }
}

fn highlighted(state: &SplitState, time: Option<Millis>, best: Option<Millis>) -> SummaryCell {
    let purple = state.out_lap_complete && time.is_some() && time == best;
    SummaryCell::time(time, if purple { CellStyle::Purple } else { CellStyle::Normal })
}

fn delta_row(state: &SplitState) -> SummaryRow {
    let sector = |i: usize| {
        delta(state.split_times[i], state.best_times[i], state.prev_best_times[i])
    };
    SummaryRow {
        label: "Delta",
        cells: [
            sector(0),
            sector(1),
            sector(2),
            delta(state.last_lap_time, state.best_lap_time, state.prev_best_lap_time),
        ],
    }
}

fn delta(current: Option<Millis>, best: Option<Millis>, previous: Option<Millis>) -> SummaryCell {
    let Some(current) = current else {
        return SummaryCell::plain(SummaryValue::Missing);
    };
    let reference = match previous {
        Some(previous) if Some(current) == best => Some(previous),
        _ => best,
    };
    SummaryCell::plain(reference.map_or(SummaryValue::Missing, |r| SummaryValue::Delta(current - r)))
}
