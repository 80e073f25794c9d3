//! Sector and lap timing from the player's track position.
//!
//! The lap is cut into three sectors by two absolute dlong thresholds. Sectors 1 and 2 close
//! when dlong reaches their threshold; sector 3 closes at the start/finish line, which shows up
//! as dlong wrapping from a large value back to a small one within a single tick.
//!
//! The first full traversal after a reset is an out-lap: its sectors are discarded and no best
//! time is taken from it.
//!
//! ```rust
//! use icr2_telemetry::splits::{SplitEvent, SplitTracker};
//!
//! let mut tracker = SplitTracker::default();
//! assert!(tracker.update(0, 0).is_empty());
//! assert_eq!(tracker.update(24_800_001, 10_000), [SplitEvent::SectorOne]);
//! assert_eq!(tracker.state().split_times[0], Some(10_000));
//! ```

mod summary;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use summary::{CellStyle, SplitSummary, SummaryCell, SummaryRow, SummaryValue};

/// Milliseconds of session time.
pub type Millis = i64;

/// Where the sectors end and how a finish-line crossing is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    /// dlong at the end of sectors 1 and 2
    pub split_points: [i32; 2],
    /// A single-tick dlong change below this is a finish-line crossing. Tuned for one track
    /// length; other tracks may need another value.
    pub wrap_threshold: i32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { split_points: [24_800_000, 42_000_000], wrap_threshold: -300_000 }
    }
}

/// The sector the car is currently driving towards the end of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Sector {
    #[default]
    First,
    Second,
    Third,
}

impl Sector {
    pub fn index(self) -> usize {
        match self {
            Sector::First => 0,
            Sector::Second => 1,
            Sector::Third => 2,
        }
    }
}

/// Something that happened during one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SplitEvent {
    #[serde(rename = "S1")]
    SectorOne,
    #[serde(rename = "S2")]
    SectorTwo,
    #[serde(rename = "S3")]
    SectorThree,
    /// A timed lap was completed
    #[serde(rename = "lap")]
    Lap,
    /// The out-lap was completed and discarded
    #[serde(rename = "lap_skipped")]
    LapSkipped,
}

impl SplitEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            SplitEvent::SectorOne => "S1",
            SplitEvent::SectorTwo => "S2",
            SplitEvent::SectorThree => "S3",
            SplitEvent::Lap => "lap",
            SplitEvent::LapSkipped => "lap_skipped",
        }
    }
}

impl fmt::Display for SplitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split timing for one session.
///
/// Changed only by [`SplitState::update`]; a reset replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitState {
    /// Last closed time per sector
    pub split_times: [Option<Millis>; 3],
    pub best_times: [Option<Millis>; 3],
    /// Best time per sector before the current best was set
    pub prev_best_times: [Option<Millis>; 3],
    pub last_lap_time: Option<Millis>,
    pub best_lap_time: Option<Millis>,
    pub prev_best_lap_time: Option<Millis>,
    pub current_sector: Sector,
    /// dlong seen on the previous update
    pub last_position: i32,
    /// Session time at which the current sector started
    pub sector_start_time: Millis,
    /// Session time of the latest update
    pub current_time: Millis,
    /// Set once the out-lap has been discarded; bests are only taken afterwards
    pub out_lap_complete: bool,
}

impl SplitState {
    /// Feed one tick of player position and session clock.
    pub fn update(
        &mut self,
        config: &SplitConfig,
        position: i32,
        session_time_ms: i32,
    ) -> Vec<SplitEvent> {
        let now = Millis::from(session_time_ms);
        let delta = i64::from(position) - i64::from(self.last_position);
        let mut events = Vec::new();

        self.current_time = now;

        match self.current_sector {
            Sector::First if position >= config.split_points[0] => {
                self.close_sector(Sector::First, now);
                self.sector_start_time = now;
                self.current_sector = Sector::Second;
                events.push(SplitEvent::SectorOne);
            }
            Sector::Second if position >= config.split_points[1] => {
                self.close_sector(Sector::Second, now);
                self.sector_start_time = now;
                self.current_sector = Sector::Third;
                events.push(SplitEvent::SectorTwo);
            }
            _ if delta < i64::from(config.wrap_threshold) => {
                if self.current_sector == Sector::Third {
                    self.close_sector(Sector::Third, now);
                    events.push(SplitEvent::SectorThree);

                    if let [Some(s1), Some(s2), Some(s3)] = self.split_times {
                        events.push(self.close_lap(s1 + s2 + s3));
                    }
                }
                self.sector_start_time = now;
                self.current_sector = Sector::First;
            }
            _ => {}
        }

        if !events.is_empty() {
            debug!(?events, position, session_time_ms, "Split events");
        }
        trace!(position, delta, sector = self.current_sector.index(), "Split update");

        self.last_position = position;
        events
    }

    fn close_sector(&mut self, sector: Sector, now: Millis) {
        let i = sector.index();
        let time = now - self.sector_start_time;
        self.split_times[i] = Some(time);
        if self.out_lap_complete {
            record_best(&mut self.best_times[i], &mut self.prev_best_times[i], time);
        }
    }

    fn close_lap(&mut self, lap_time: Millis) -> SplitEvent {
        if !self.out_lap_complete {
            self.split_times = [None; 3];
            self.out_lap_complete = true;
            return SplitEvent::LapSkipped;
        }

        self.last_lap_time = Some(lap_time);
        record_best(&mut self.best_lap_time, &mut self.prev_best_lap_time, lap_time);
        SplitEvent::Lap
    }

    /// Elapsed time in the sector being driven, once timing is live.
    pub fn live_sector_time(&self) -> Option<Millis> {
        (self.out_lap_complete && self.sector_start_time != 0)
            .then(|| self.current_time - self.sector_start_time)
    }

    /// Project the state into the three-row split table.
    pub fn summary(&self) -> SplitSummary {
        SplitSummary::from_state(self)
    }
}

/// Replace `best` when `time` beats it, keeping the superseded value in `previous`.
fn record_best(best: &mut Option<Millis>, previous: &mut Option<Millis>, time: Millis) {
    if best.is_none_or(|b| time < b) {
        *previous = *best;
        *best = Some(time);
    }
}

/// Split state together with the configuration it is updated against.
#[derive(Debug, Clone, Default)]
pub struct SplitTracker {
    config: SplitConfig,
    state: SplitState,
}

impl SplitTracker {
    pub fn new(config: SplitConfig) -> Self {
        Self { config, state: SplitState::default() }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn state(&self) -> &SplitState {
        &self.state
    }

    pub fn update(&mut self, position: i32, session_time_ms: i32) -> Vec<SplitEvent> {
        self.state.update(&self.config, position, session_time_ms)
    }

    /// Start over with fresh state, out-lap included.
    pub fn reset(&mut self) {
        debug!("Resetting split state");
        self.state = SplitState::default();
    }

    pub fn summary(&self) -> SplitSummary {
        self.state.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const S1: i32 = 24_800_000;
    const S2: i32 = 42_000_000;

    /// Drive one lap starting at `start`, taking `times` ms per sector.
    /// Ends just after the start/finish line.
    fn drive_lap(tracker: &mut SplitTracker, start: i32, times: [i32; 3]) -> Vec<SplitEvent> {
        let mut events = Vec::new();
        events.extend(tracker.update(S1 + 1, start + times[0]));
        events.extend(tracker.update(S2 + 1, start + times[0] + times[1]));
        events.extend(tracker.update(100, start + times[0] + times[1] + times[2]));
        events
    }

    /// Reset, then drive the out-lap so the tracker is ready to time laps.
    /// Returns the session time at the finish line.
    fn after_out_lap(tracker: &mut SplitTracker) -> i32 {
        tracker.update(0, 0);
        let events = drive_lap(tracker, 0, [10_000, 15_000, 15_000]);
        assert_eq!(
            events,
            [
                SplitEvent::SectorOne,
                SplitEvent::SectorTwo,
                SplitEvent::SectorThree,
                SplitEvent::LapSkipped
            ]
        );
        40_000
    }

    #[test]
    fn first_two_sectors_close_on_thresholds() {
        let mut tracker = SplitTracker::default();

        assert!(tracker.update(0, 0).is_empty());
        assert_eq!(tracker.update(24_800_001, 10_000), [SplitEvent::SectorOne]);
        assert_eq!(tracker.update(42_000_001, 25_000), [SplitEvent::SectorTwo]);

        let state = tracker.state();
        assert_eq!(state.split_times[0], Some(10_000));
        assert_eq!(state.split_times[1], Some(15_000));
        assert_eq!(state.current_sector, Sector::Third);
    }

    #[test]
    fn out_lap_is_skipped_and_cleared() {
        let mut tracker = SplitTracker::default();
        tracker.update(0, 0);
        tracker.update(24_800_001, 10_000);
        tracker.update(42_000_001, 25_000);

        let events = tracker.update(42_000_001 - 400_000, 40_000);
        assert_eq!(events, [SplitEvent::SectorThree, SplitEvent::LapSkipped]);

        let state = tracker.state();
        assert_eq!(state.split_times, [None; 3]);
        assert_eq!(state.best_times, [None; 3]);
        assert_eq!(state.prev_best_times, [None; 3]);
        assert_eq!(state.last_lap_time, None);
        assert_eq!(state.best_lap_time, None);
        assert!(state.out_lap_complete);
        assert_eq!(state.current_sector, Sector::First);
        assert_eq!(state.sector_start_time, 40_000);
    }

    #[test]
    fn second_traversal_is_a_timed_lap() {
        let mut tracker = SplitTracker::default();
        let start = after_out_lap(&mut tracker);

        let events = drive_lap(&mut tracker, start, [5_000, 5_000, 5_000]);
        assert_eq!(
            events,
            [SplitEvent::SectorOne, SplitEvent::SectorTwo, SplitEvent::SectorThree, SplitEvent::Lap]
        );

        let state = tracker.state();
        assert_eq!(state.last_lap_time, Some(15_000));
        assert_eq!(state.best_lap_time, Some(15_000));
        assert_eq!(state.prev_best_lap_time, None);
        assert_eq!(state.best_times, [Some(5_000); 3]);
    }

    #[test]
    fn faster_lap_shifts_best_into_previous() {
        let mut tracker = SplitTracker::default();
        let start = after_out_lap(&mut tracker);

        drive_lap(&mut tracker, start, [5_000, 6_000, 7_000]);
        drive_lap(&mut tracker, start + 18_000, [4_000, 6_500, 6_000]);

        let state = tracker.state();
        assert_eq!(state.last_lap_time, Some(16_500));
        assert_eq!(state.best_lap_time, Some(16_500));
        assert_eq!(state.prev_best_lap_time, Some(18_000));
        assert_eq!(state.best_times, [Some(4_000), Some(6_000), Some(6_000)]);
        assert_eq!(state.prev_best_times, [Some(5_000), None, Some(7_000)]);
    }

    #[test]
    fn slower_lap_leaves_bests_alone() {
        let mut tracker = SplitTracker::default();
        let start = after_out_lap(&mut tracker);

        drive_lap(&mut tracker, start, [5_000, 5_000, 5_000]);
        drive_lap(&mut tracker, start + 15_000, [6_000, 6_000, 6_000]);

        let state = tracker.state();
        assert_eq!(state.last_lap_time, Some(18_000));
        assert_eq!(state.best_lap_time, Some(15_000));
        assert_eq!(state.prev_best_lap_time, None);
    }

    #[test]
    fn equal_time_is_not_a_new_best() {
        let mut best = Some(5_000);
        let mut previous = Some(6_000);
        record_best(&mut best, &mut previous, 5_000);
        assert_eq!((best, previous), (Some(5_000), Some(6_000)));

        record_best(&mut best, &mut previous, 4_999);
        assert_eq!((best, previous), (Some(4_999), Some(5_000)));
    }

    #[test]
    fn wrap_before_third_sector_restarts_sector_one() {
        let mut tracker = SplitTracker::default();
        tracker.update(10_000_000, 0);
        tracker.update(24_800_001, 8_000);

        // Car sent back to the pits mid-lap
        let events = tracker.update(1_000, 9_000);
        assert!(events.is_empty());

        let state = tracker.state();
        assert_eq!(state.current_sector, Sector::First);
        assert_eq!(state.sector_start_time, 9_000);
        assert_eq!(state.split_times[0], Some(8_000));
    }

    #[test]
    fn small_backward_moves_are_ignored() {
        let mut tracker = SplitTracker::default();
        tracker.update(30_000_000, 0);
        tracker.update(30_000_000, 0);

        assert!(tracker.update(29_800_000, 100).is_empty());
        assert_eq!(tracker.state().last_position, 29_800_000);
    }

    #[test]
    fn configured_threshold_is_used() {
        let config = SplitConfig { split_points: [100, 200], wrap_threshold: -50 };
        let mut tracker = SplitTracker::new(config);
        tracker.update(0, 0);
        tracker.update(101, 10);
        tracker.update(201, 20);

        assert!(tracker.update(160, 30).is_empty());
        assert_eq!(tracker.update(100, 40), [SplitEvent::SectorThree, SplitEvent::LapSkipped]);
    }

    #[test]
    fn reset_replaces_everything() {
        let mut tracker = SplitTracker::default();
        let start = after_out_lap(&mut tracker);
        drive_lap(&mut tracker, start, [5_000, 5_000, 5_000]);

        tracker.reset();
        assert_eq!(tracker.state(), &SplitState::default());

        // The next traversal is an out-lap again
        tracker.update(0, 100_000);
        let events = drive_lap(&mut tracker, 100_000, [5_000, 5_000, 5_000]);
        assert_eq!(events.last(), Some(&SplitEvent::LapSkipped));
        assert_eq!(tracker.state().best_lap_time, None);
    }

    #[test]
    fn event_names_match_wire_strings() {
        let names: Vec<String> = [
            SplitEvent::SectorOne,
            SplitEvent::SectorTwo,
            SplitEvent::SectorThree,
            SplitEvent::Lap,
            SplitEvent::LapSkipped,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(names, ["S1", "S2", "S3", "lap", "lap_skipped"]);
        assert_eq!(serde_json::to_string(&SplitEvent::LapSkipped).unwrap(), "\"lap_skipped\"");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: SplitConfig = serde_yaml_ng::from_str("wrap_threshold: -250000").unwrap();
        assert_eq!(config.split_points, [24_800_000, 42_000_000]);
        assert_eq!(config.wrap_threshold, -250_000);
    }

    fn expected_next(sector: Sector) -> Sector {
        match sector {
            Sector::First => Sector::Second,
            Sector::Second => Sector::Third,
            Sector::Third => Sector::First,
        }
    }

    proptest! {
        #[test]
        fn sectors_advance_in_order(
            laps in prop::collection::vec(prop::collection::vec(0i32..2_000_000, 1..40), 1..6),
            step_ms in 1i32..500,
        ) {
            let mut tracker = SplitTracker::default();
            let mut time = 0;
            tracker.update(0, time);

            for lap in laps {
                // Non-decreasing positions within a lap, then a wrap back to the start
                let mut position = 0i32;
                let mut positions: Vec<i32> = lap
                    .iter()
                    .map(|step| {
                        position = position.saturating_add(*step);
                        position
                    })
                    .collect();
                positions.push(0);

                for position in positions {
                    let before = tracker.state().current_sector;
                    time += step_ms;
                    tracker.update(position, time);
                    let after = tracker.state().current_sector;
                    prop_assert!(after == before || after == expected_next(before) || after == Sector::First);
                }
            }
        }

        #[test]
        fn bests_never_increase_and_laps_sum_sectors(
            laps in prop::collection::vec(prop::array::uniform3(1i32..60_000), 1..8),
        ) {
            let mut tracker = SplitTracker::default();
            let mut time = after_out_lap(&mut tracker);
            let mut previous_best: Option<SplitState> = None;

            for times in laps {
                let events = drive_lap(&mut tracker, time, times);
                time += times.iter().sum::<i32>();
                prop_assert_eq!(events.last(), Some(&SplitEvent::Lap));

                let state = tracker.state().clone();
                let [s1, s2, s3] = state.split_times;
                prop_assert_eq!(state.last_lap_time, Some(s1.unwrap() + s2.unwrap() + s3.unwrap()));

                if let Some(before) = &previous_best {
                    for i in 0..3 {
                        prop_assert!(state.best_times[i] <= before.best_times[i]);
                        if state.best_times[i] != before.best_times[i] {
                            prop_assert_eq!(state.prev_best_times[i], before.best_times[i]);
                        }
                    }
                    prop_assert!(state.best_lap_time <= before.best_lap_time);
                    if state.best_lap_time != before.best_lap_time {
                        prop_assert_eq!(state.prev_best_lap_time, before.best_lap_time);
                    }
                }
                previous_best = Some(state);
            }
        }
    }
}
