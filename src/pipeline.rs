//! # Frame dispatch and progress
//!
//! Glue between the frame boundary and the accumulator: [`process_frame`]
//! routes each frame by its type tag, and [`FrameCounter`] keeps a live tally
//! of the frame types flowing through the stage.

use std::collections::HashMap;
use std::time::Duration;

use ahash::RandomState;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use crate::constants::FOCALPLANE_FIELD;
use crate::frame::{Frame, FrameKind};
use crate::mapmaker::{FinalMap, MapMaker};
use crate::todmap_errors::TodmapError;

/// Route one frame to the accumulator.
///
/// Calibration frames feed the focal plane, scan frames are reduced into the
/// grids, the end-of-stream marker finalizes the map, and any other frame
/// type passes through without touching the accumulator. The frame itself is
/// never mutated.
///
/// Arguments
/// ---------
/// * `mapmaker`: the accumulator owning the map state.
/// * `frame`: the incoming frame.
///
/// Return
/// ------
/// * `Ok(Some(FinalMap))` for the end-of-stream frame, `Ok(None)` for every
///   other successfully processed frame.
pub fn process_frame(
    mapmaker: &mut MapMaker,
    frame: &Frame,
) -> Result<Option<FinalMap>, TodmapError> {
    match frame.kind {
        FrameKind::Calibration => {
            let blob = frame
                .bytes(FOCALPLANE_FIELD)
                .ok_or_else(|| TodmapError::MissingFrameField(FOCALPLANE_FIELD.to_string()))?;
            mapmaker.handle_calibration(blob)?;
            Ok(None)
        }
        FrameKind::Scan => {
            let batch = frame.scan_batch()?;
            mapmaker.handle_scan(&batch)?;
            Ok(None)
        }
        FrameKind::EndProcessing => {
            debug!("end of stream, finalizing map");
            Ok(Some(mapmaker.finalize()))
        }
        FrameKind::Other => Ok(None),
    }
}

/// Live tally of the frame types passing through the stage.
///
/// Consecutive frames of the same type are collapsed into a single
/// `<kind> (xN)` line, which makes the tally usable as a progress indicator
/// on long scan runs. Totals per kind stay queryable after the stream ends.
pub struct FrameCounter {
    bar: ProgressBar,
    previous: Option<FrameKind>,
    run_length: u64,
    totals: HashMap<FrameKind, u64, RandomState>,
}

impl FrameCounter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}").expect("indicatif template"),
        );
        bar.enable_steady_tick(Duration::from_millis(200));
        FrameCounter {
            bar,
            previous: None,
            run_length: 0,
            totals: HashMap::default(),
        }
    }

    /// Record one frame and refresh the live line.
    pub fn count(&mut self, frame: &Frame) {
        if self.previous == Some(frame.kind) {
            self.run_length += 1;
            self.bar
                .set_message(format!("{} (x{})", frame.kind, self.run_length));
        } else {
            self.previous = Some(frame.kind);
            self.run_length = 1;
            self.bar.set_message(frame.kind.to_string());
        }
        *self.totals.entry(frame.kind).or_insert(0) += 1;

        if frame.kind == FrameKind::EndProcessing {
            self.finish();
        }
    }

    /// Number of frames of one kind seen so far.
    pub fn total(&self, kind: FrameKind) -> u64 {
        self.totals.get(&kind).copied().unwrap_or(0)
    }

    /// Stop the live line, leaving the last message visible.
    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}
