//! The Lap Timer (F): GPS-driven line-crossing lap/sector timing
//! (`spec.md` §4.6, §3.4).
//!
//! `delta_ms`/`predicted_ms` resolve the progress-fraction redesign flag
//! (`spec.md` §9) against the best lap's sector boundaries: progress through
//! the lap is `(completed_sectors + fraction_of_current_sector) /
//! total_sectors`, and `predicted_ms` projects the current delta forward
//! onto the best lap's total time.

use heapless::Vec;
use racing_common::consts::{MAX_LAP_HISTORY, MAX_SECTORS, MAX_TRACKS};

use crate::bus::SignalBus;
use crate::lap::geo::{GeoPoint, Line, LineCrossingDetector};

/// A GPS-learned track: start/finish line plus ordered sector lines.
#[derive(Debug, Clone)]
pub struct Track {
    pub name: heapless::String<32>,
    pub start_finish: Line,
    pub sectors: Vec<Line, MAX_SECTORS>,
}

/// One completed (or in-progress-snapshot) lap record (`spec.md` §3.4).
#[derive(Debug, Clone)]
pub struct Lap {
    pub number: u32,
    pub total_ms: u64,
    pub sector_times_ms: Vec<u64, MAX_SECTORS>,
    pub start: GeoPoint,
    pub max_speed_mps: f64,
    pub avg_speed_mps: f64,
    pub timestamp_ms: u64,
    pub valid: bool,
    pub out_lap: bool,
    pub in_lap: bool,
}

/// One GPS sample as consumed by the lap timer.
#[derive(Debug, Clone, Copy)]
pub struct GpsSample {
    pub pos: GeoPoint,
    pub speed_mps: f64,
    pub heading_deg: f64,
    pub now_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LapTimerState {
    NotStarted,
    OnLap {
        sector_idx: u8,
        lap_start_ms: u64,
        sector_start_ms: u64,
    },
    LapComplete,
}

/// Owns the active track, crossing detectors, and lap history.
#[derive(Debug)]
pub struct LapTimer {
    track: Option<Track>,
    start_finish_detector: LineCrossingDetector,
    sector_detectors: Vec<LineCrossingDetector, MAX_SECTORS>,
    state: LapTimerState,
    next_lap_number: u32,
    current_sector_times: Vec<u64, MAX_SECTORS>,
    current_valid: bool,
    current_start: GeoPoint,
    current_max_speed: f64,
    current_speed_sum: f64,
    current_speed_samples: u32,
    last_lap: Option<Lap>,
    best_lap: Option<Lap>,
    /// Contiguous history of completed laps (`spec.md` §3.4 "Session").
    session: Vec<Lap, MAX_LAP_HISTORY>,
    /// Best time recorded per sector index across the whole session.
    best_sector_times_ms: Vec<Option<u64>, MAX_SECTORS>,
}

impl Default for LapTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl LapTimer {
    pub fn new() -> Self {
        Self {
            track: None,
            start_finish_detector: LineCrossingDetector::new(),
            sector_detectors: Vec::new(),
            state: LapTimerState::NotStarted,
            next_lap_number: 1,
            current_sector_times: Vec::new(),
            current_valid: true,
            current_start: GeoPoint::new(0.0, 0.0),
            current_max_speed: 0.0,
            current_speed_sum: 0.0,
            current_speed_samples: 0,
            last_lap: None,
            best_lap: None,
            session: Vec::new(),
            best_sector_times_ms: Vec::new(),
        }
    }

    /// Load a track, resetting in-progress lap state.
    pub fn set_track(&mut self, track: Track) {
        let mut detectors = Vec::new();
        for _ in &track.sectors {
            let _ = detectors.push(LineCrossingDetector::new());
        }
        self.sector_detectors = detectors;
        self.start_finish_detector = LineCrossingDetector::new();
        self.state = LapTimerState::NotStarted;
        self.track = Some(track);
    }

    /// Scan `known_tracks` for one whose start/finish point lies within
    /// `spec.md`'s auto-detect radius of `pos`; load the first match.
    pub fn autodetect(&mut self, pos: GeoPoint, known_tracks: &Vec<Track, MAX_TRACKS>) -> bool {
        use crate::lap::geo::haversine_distance_m;
        use racing_common::consts::TRACK_AUTODETECT_RADIUS_M;

        for track in known_tracks {
            if haversine_distance_m(pos, track.start_finish.p1) <= TRACK_AUTODETECT_RADIUS_M {
                self.set_track(track.clone());
                return true;
            }
        }
        false
    }

    pub fn best_lap(&self) -> Option<&Lap> {
        self.best_lap.as_ref()
    }

    pub fn last_lap(&self) -> Option<&Lap> {
        self.last_lap.as_ref()
    }

    /// Contiguous history of completed laps for the active session.
    pub fn session(&self) -> &[Lap] {
        &self.session
    }

    /// Best time recorded per sector index, across the whole session.
    pub fn best_sector_times_ms(&self) -> &[Option<u64>] {
        &self.best_sector_times_ms
    }

    /// Process one GPS update: run crossing detection, advance the lap
    /// state machine, and publish `lap.*` channels onto the bus.
    pub fn process(&mut self, bus: &mut SignalBus, sample: GpsSample) {
        let Some(track) = self.track.clone() else {
            return;
        };

        self.current_max_speed = self.current_max_speed.max(sample.speed_mps);
        self.current_speed_sum += sample.speed_mps;
        self.current_speed_samples += 1;

        let crossed_start_finish =
            self.start_finish_detector.update(sample.pos, sample.heading_deg, &track.start_finish);

        let mut crossed_sector: Option<usize> = None;
        for (idx, line) in track.sectors.iter().enumerate() {
            if let Some(detector) = self.sector_detectors.get_mut(idx) {
                if detector.update(sample.pos, sample.heading_deg, line) {
                    crossed_sector = Some(idx);
                    break;
                }
            }
        }

        match self.state {
            LapTimerState::NotStarted => {
                if crossed_start_finish {
                    self.begin_lap(sample);
                }
            }
            LapTimerState::OnLap {
                sector_idx,
                lap_start_ms,
                sector_start_ms,
            } => {
                if let Some(idx) = crossed_sector {
                    if idx as u8 == sector_idx && (idx as usize) < track.sectors.len() {
                        let _ = self.current_sector_times.push(sample.now_ms.saturating_sub(lap_start_ms));
                        self.state = LapTimerState::OnLap {
                            sector_idx: sector_idx + 1,
                            lap_start_ms,
                            sector_start_ms: sample.now_ms,
                        };
                    } else {
                        // Out-of-order crossing: invalidates the lap but keeps timing running.
                        self.current_valid = false;
                    }
                }

                if crossed_start_finish {
                    self.complete_lap(sample, lap_start_ms);
                    self.begin_lap(sample);
                }
            }
            LapTimerState::LapComplete => {
                // Transition is momentary; begin_lap always re-arms OnLap in the
                // same tick it fires, so this arm is unreachable across ticks.
                self.state = LapTimerState::NotStarted;
            }
        }

        self.publish(bus, sample.now_ms);
    }

    fn begin_lap(&mut self, sample: GpsSample) {
        self.current_sector_times = Vec::new();
        self.current_valid = true;
        self.current_start = sample.pos;
        self.current_max_speed = sample.speed_mps;
        self.current_speed_sum = sample.speed_mps;
        self.current_speed_samples = 1;
        self.state = LapTimerState::OnLap {
            sector_idx: 0,
            lap_start_ms: sample.now_ms,
            sector_start_ms: sample.now_ms,
        };
    }

    fn complete_lap(&mut self, sample: GpsSample, lap_start_ms: u64) {
        let Some(track) = &self.track else { return };
        let total_ms = sample.now_ms.saturating_sub(lap_start_ms);
        let valid = self.current_valid && self.current_sector_times.len() == track.sectors.len();

        let avg_speed = if self.current_speed_samples > 0 {
            self.current_speed_sum / self.current_speed_samples as f64
        } else {
            0.0
        };

        let lap = Lap {
            number: self.next_lap_number,
            total_ms,
            sector_times_ms: self.current_sector_times.clone(),
            start: self.current_start,
            max_speed_mps: self.current_max_speed,
            avg_speed_mps: avg_speed,
            timestamp_ms: sample.now_ms,
            valid,
            out_lap: self.last_lap.is_none(),
            in_lap: false,
        };

        self.next_lap_number += 1;

        if valid {
            let becomes_best = match &self.best_lap {
                None => true,
                Some(best) => lap.total_ms < best.total_ms,
            };
            if becomes_best {
                self.best_lap = Some(lap.clone());
            }

            while self.best_sector_times_ms.len() < lap.sector_times_ms.len() {
                let _ = self.best_sector_times_ms.push(None);
            }
            for (idx, &t) in lap.sector_times_ms.iter().enumerate() {
                let slot = &mut self.best_sector_times_ms[idx];
                let improves = match slot {
                    None => true,
                    Some(best) => t < *best,
                };
                if improves {
                    *slot = Some(t);
                }
            }
        }

        if self.session.push(lap.clone()).is_err() {
            self.session.remove(0);
            let _ = self.session.push(lap.clone());
        }

        self.last_lap = Some(lap);
        self.state = LapTimerState::LapComplete;
    }

    fn delta_ms(&self, now_ms: u64) -> Option<f64> {
        let best = self.best_lap.as_ref()?;
        let LapTimerState::OnLap {
            sector_idx,
            lap_start_ms,
            sector_start_ms,
        } = self.state
        else {
            return None;
        };
        if best.sector_times_ms.is_empty() {
            return None;
        }

        let elapsed_ms = now_ms.saturating_sub(lap_start_ms) as f64;
        let total_sectors = best.sector_times_ms.len().max(1) as f64;
        let best_sector_ms = best
            .sector_times_ms
            .get(sector_idx as usize)
            .copied()
            .unwrap_or(0) as f64;
        let elapsed_in_sector = now_ms.saturating_sub(sector_start_ms) as f64;
        let sector_progress = if best_sector_ms > 0.0 {
            (elapsed_in_sector / best_sector_ms).min(1.0)
        } else {
            0.0
        };
        let progress_fraction = (sector_idx as f64 + sector_progress) / total_sectors;
        let best_time_at_progress = progress_fraction * best.total_ms as f64;
        Some(elapsed_ms - best_time_at_progress)
    }

    fn predicted_ms(&self, now_ms: u64) -> Option<f64> {
        let best = self.best_lap.as_ref()?;
        Some(best.total_ms as f64 + self.delta_ms(now_ms)?)
    }

    fn publish(&self, bus: &mut SignalBus, now_ms: u64) {
        if let Some(last) = &self.last_lap {
            bus.set_numeric("lap.last_time_s", last.total_ms as f64 / 1000.0, now_ms);
        }
        if let Some(best) = &self.best_lap {
            bus.set_numeric("lap.best_time_s", best.total_ms as f64 / 1000.0, now_ms);
        }

        let (current_time_s, number, sector) = match self.state {
            LapTimerState::OnLap {
                sector_idx,
                lap_start_ms,
                ..
            } => (
                now_ms.saturating_sub(lap_start_ms) as f64 / 1000.0,
                self.next_lap_number as f64,
                sector_idx as f64,
            ),
            _ => (0.0, self.next_lap_number as f64, 0.0),
        };
        bus.set_numeric("lap.current_time_s", current_time_s, now_ms);
        bus.set_numeric("lap.number", number, now_ms);
        bus.set_numeric("lap.sector", sector, now_ms);

        if let Some(delta) = self.delta_ms(now_ms) {
            bus.set_numeric("lap.delta_ms", delta, now_ms);
        }
        if let Some(predicted) = self.predicted_ms(now_ms) {
            bus.set_numeric("lap.predicted_ms", predicted, now_ms);
        }
    }
}
