//! Plain-text telemetry block for terminals.

use std::io::Write;

use super::DisplaySink;
use crate::types::{TickReport, units};
use crate::{Result, TelemetryError};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Text shown for one report: three telemetry lines, then the split table.
pub fn render_text_block(report: &TickReport) -> String {
    let data = match report {
        TickReport::Data(data) => data,
        TickReport::NoData { reason } => return format!("No data: {}", reason),
    };

    let Some(player) = data.snapshot.player() else {
        return "Waiting for player car data...".to_string();
    };

    let time = data.snapshot.session_time_ms;
    let minutes = time.div_euclid(60_000);
    let seconds = f64::from(time.rem_euclid(60_000)) / 1000.0;

    let line1 = format!(
        "Time: {:02}:{:06.3} | Speed: {:<3} | DLONG: {:<8} | DLAT: {:<8}",
        minutes,
        seconds,
        units::speed_mph_whole(i64::from(player.speed)),
        player.dlong,
        player.dlat
    );
    let line2 = format!(
        "Rotation: {:.1} | Steer angle: {:.1}",
        player.rotation_degrees(),
        player.steering_degrees()
    );
    let line3 = format!(
        "Durability: {:6.2}% | Boost: {:5.2}",
        data.snapshot.durability_percent(),
        data.snapshot.boost_psi
    );

    format!("{}\n{}\n{}\n{}", line1, line2, line3, data.summary)
}

/// Writes text blocks to a terminal or any other writer.
pub struct ConsoleDisplay<W> {
    out: W,
    /// Clear the screen before each block
    redraw: bool,
}

impl ConsoleDisplay<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), true)
    }
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W, redraw: bool) -> Self {
        Self { out, redraw }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_block(&mut self, text: &str) -> Result<()> {
        let prefix = if self.redraw { CLEAR_SCREEN } else { "" };
        writeln!(self.out, "{}{}", prefix, text)
            .and_then(|()| self.out.flush())
            .map_err(|e| TelemetryError::output_failed("console", e))
    }
}

impl<W: Write> DisplaySink for ConsoleDisplay<W> {
    fn show(&mut self, report: &TickReport) -> Result<()> {
        let block = render_text_block(report);
        let events = report.events();
        if events.is_empty() {
            self.write_block(&block)
        } else {
            let names: Vec<&str> = events.iter().map(|e| e.as_str()).collect();
            self.write_block(&format!("{}\n>> {}", block, names.join(" ")))
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.write_block("Splits reset.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splits::{SplitEvent, SplitTracker};
    use crate::types::{CAR_SLOTS, CarRecord, PLAYER_SLOT, TelemetrySnapshot, TickData};

    fn report(time: i32, player: CarRecord, events: Vec<SplitEvent>) -> TickReport {
        let mut cars = vec![CarRecord::default(); CAR_SLOTS];
        cars[PLAYER_SLOT] = player;
        TickReport::Data(TickData {
            tick: 1,
            snapshot: TelemetrySnapshot {
                session_time_ms: time,
                lap_time_raw: 0,
                durability_raw: 9_830_400,
                boost_psi: 29.0,
                cars,
            },
            events,
            summary: SplitTracker::default().summary(),
        })
    }

    #[test]
    fn text_block_has_telemetry_and_split_rows() {
        let player = CarRecord {
            dlong: 24_800_001,
            dlat: -512,
            speed: 15_074,
            rotation: 1 << 30,
            steering: 5_800_000,
            ..CarRecord::default()
        };
        let block = render_text_block(&report(83_250, player, vec![]));
        let lines: Vec<&str> = block.lines().collect();

        assert_eq!(
            lines[0],
            "Time: 01:23.250 | Speed: 200 | DLONG: 24800001 | DLAT: -512    "
        );
        assert_eq!(lines[1], "Rotation: 90.0 | Steer angle: 0.5");
        assert_eq!(lines[2], "Durability: 100.00% | Boost: 29.00");
        assert!(lines[3].starts_with("Best: "));
        assert!(lines[4].starts_with("Last: "));
        assert!(lines[5].starts_with("Delta: "));
    }

    #[test]
    fn no_data_is_shown_instead_of_stale_values() {
        let block = render_text_block(&TickReport::no_data("Failed to read 4 bytes at 0x4ef858"));
        assert_eq!(block, "No data: Failed to read 4 bytes at 0x4ef858");
    }

    #[test]
    fn console_writes_events_and_resets() {
        let mut display = ConsoleDisplay::new(Vec::new(), false);
        display
            .show(&report(0, CarRecord::default(), vec![SplitEvent::SectorThree, SplitEvent::Lap]))
            .unwrap();
        display.reset().unwrap();

        let text = String::from_utf8(display.into_inner()).unwrap();
        assert!(text.contains(">> S3 lap\n"));
        assert!(text.ends_with("Splits reset.\n"));
        assert!(!text.contains(CLEAR_SCREEN));
    }
}
