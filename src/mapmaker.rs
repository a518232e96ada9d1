//! # MapMaker: time-ordered data to binned sky map
//!
//! This module defines the [`MapMaker`](crate::mapmaker::MapMaker) struct, the
//! stateful accumulator that reduces multi-detector time-ordered data into a
//! pixelized sky-intensity map:
//!
//! 1. **Calibration** — a serialized focal-plane table
//!    ([`FocalPlane`](crate::focal_plane::FocalPlane)) maps each detector id
//!    to its fixed offset rotation. A later calibration replaces the table
//!    wholesale.
//! 2. **Scan reduction** — each [`ScanBatch`] is consumed immediately: per
//!    detector, the raw signal is decompressed if affine compression
//!    parameters are present, per-sample pointings are reconstructed from
//!    the boresight stream and the detector offset, and in-map samples are
//!    histogrammed into the signal and hit-count grids.
//! 3. **Finalization** — a pure, idempotent read producing the
//!    [`FinalMap`]: the summed signal masked by hit presence, plus the grid
//!    edges for coordinate labeling.
//!
//! ## Processing model
//!
//! Strictly sequential: one event at a time, in delivery order, exactly one
//! writer. A batch is either fully binned or rejected without touching the
//! grids — a map silently missing a detector's geometry would be misleading,
//! so an unknown detector aborts the whole batch.
//!
//! ## Known limitation
//!
//! Right ascension is normalized into `[0, 360)`, so a map whose RA span
//! crosses the 0°/360° seam under-counts near the seam (see
//! [`unit_vector_to_radec`](crate::pointing::unit_vector_to_radec)).

use itertools::izip;
use log::{debug, trace};
use nalgebra::{DMatrix, UnitQuaternion};
use std::collections::HashMap;

use ahash::RandomState;

use crate::constants::{Degree, DetectorId, SignalMap};
use crate::focal_plane::FocalPlane;
use crate::map_grid::{MapConfig, MapGrid};
use crate::pointing::{boresight_from_wire, pointing_radec};
use crate::todmap_errors::TodmapError;

/// Affine decompression parameters for one detector's raw stream.
///
/// Reconstruction is `physical = raw / gain + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compression {
    pub gain: f64,
    pub offset: f64,
}

/// One scan event's worth of data. Transient: reduced immediately, never
/// retained across events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanBatch {
    /// Boresight orientation stream, one scalar-first `[w, x, y, z]`
    /// quaternion per time sample.
    pub boresight: Vec<[f64; 4]>,
    /// Raw signal streams keyed by detector id, one value per time sample.
    pub signal: SignalMap,
    /// Optional per-detector decompression parameters.
    pub compression: HashMap<DetectorId, Compression, RandomState>,
}

/// Finished map produced at end-of-stream.
///
/// Pixels with zero hits hold exactly `0.0`; all other pixels hold the
/// accumulated signal sum for that pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalMap {
    /// Shape `(ny, nx)`: rows are Dec bins, columns are RA bins.
    pub signal: DMatrix<f64>,
    pub ra_edges: Vec<Degree>,
    pub dec_edges: Vec<Degree>,
}

/// Stateful accumulator turning calibration and scan events into a sky map.
#[derive(Debug, Clone)]
pub struct MapMaker {
    grid: MapGrid,
    focal_plane: Option<FocalPlane>,
    signal_sum: DMatrix<f64>,
    hit_count: DMatrix<u64>,
}

impl MapMaker {
    /// Construct an accumulator with zeroed grids for the given geometry.
    ///
    /// Arguments
    /// ---------
    /// * `config`: map center, extent, and pixel size, in degrees.
    ///
    /// Return
    /// ------
    /// * A new [`MapMaker`], or a [`TodmapError`] if the configuration yields
    ///   an empty grid or a non-positive resolution.
    pub fn new(config: MapConfig) -> Result<Self, TodmapError> {
        let grid = MapGrid::new(config)?;
        let (ny, nx) = (grid.ny(), grid.nx());
        Ok(MapMaker {
            grid,
            focal_plane: None,
            signal_sum: DMatrix::zeros(ny, nx),
            hit_count: DMatrix::zeros(ny, nx),
        })
    }

    /// Ingest a calibration event.
    ///
    /// Decodes the serialized focal-plane table and replaces any previous
    /// table wholesale (last write wins, tables are never merged). On decode
    /// failure the previous table, if any, stays in effect.
    pub fn handle_calibration(&mut self, blob: &[u8]) -> Result<(), TodmapError> {
        let focal_plane = FocalPlane::from_parquet_bytes(blob)?;
        debug!(
            "focal plane calibration: {} detectors (replacing previous: {})",
            focal_plane.len(),
            self.focal_plane.is_some()
        );
        self.focal_plane = Some(focal_plane);
        Ok(())
    }

    /// Reduce one scan batch into the map grids.
    ///
    /// The whole batch is validated before any grid mutation: a missing
    /// focal plane, a detector absent from it, or a signal stream whose
    /// length disagrees with the boresight stream rejects the batch with the
    /// grids untouched. In-map samples add the physical signal value to the
    /// signal grid and increment the hit count; off-map samples are dropped
    /// silently.
    pub fn handle_scan(&mut self, batch: &ScanBatch) -> Result<(), TodmapError> {
        let Self {
            grid,
            focal_plane,
            signal_sum,
            hit_count,
        } = self;
        let focal_plane = focal_plane.as_ref().ok_or(TodmapError::MissingCalibration)?;

        // Deterministic detector order, so identical batches always produce
        // bit-identical grids.
        let mut detectors: Vec<&DetectorId> = batch.signal.keys().collect();
        detectors.sort_unstable();

        let n_samples = batch.boresight.len();
        let mut work: Vec<(&DetectorId, &UnitQuaternion<f64>, &[f64])> =
            Vec::with_capacity(detectors.len());
        for id in detectors {
            let offset = focal_plane
                .offset(id)
                .ok_or_else(|| TodmapError::UnknownDetector(id.clone()))?;
            let raw = batch.signal[id].as_slice();
            if raw.len() != n_samples {
                return Err(TodmapError::MismatchedScanLengths {
                    detector: id.clone(),
                    signal: raw.len(),
                    boresight: n_samples,
                });
            }
            work.push((id, offset, raw));
        }

        let boresight: Vec<UnitQuaternion<f64>> =
            batch.boresight.iter().map(boresight_from_wire).collect();

        let mut binned = 0_usize;
        let mut dropped = 0_usize;
        for (id, offset, raw) in work {
            let physical: Vec<f64> = match batch.compression.get(id) {
                Some(c) => raw.iter().map(|y| y / c.gain + c.offset).collect(),
                None => raw.to_vec(),
            };

            for (orientation, y) in izip!(&boresight, &physical) {
                let (ra, dec) = pointing_radec(orientation, offset);
                match (grid.bin_dec(dec), grid.bin_ra(ra)) {
                    (Some(i), Some(j)) => {
                        signal_sum[(i, j)] += y;
                        hit_count[(i, j)] += 1;
                        binned += 1;
                    }
                    _ => dropped += 1,
                }
            }
        }

        trace!(
            "scan batch reduced: {} samples binned, {} off-map",
            binned,
            dropped
        );
        Ok(())
    }

    /// Produce the finished map. Pure read of the accumulated state:
    /// idempotent, and the accumulator itself is left untouched.
    ///
    /// Pixels with at least one hit carry the accumulated signal sum; pixels
    /// with none carry exactly `0.0`.
    // TODO: decide with the receiver team whether the exported signal should
    // be divided by the hit count to yield a per-pixel average.
    pub fn finalize(&self) -> FinalMap {
        let signal = self
            .signal_sum
            .zip_map(&self.hit_count, |s, h| if h > 0 { s } else { 0.0 });
        FinalMap {
            signal,
            ra_edges: self.grid.ra_edges().to_vec(),
            dec_edges: self.grid.dec_edges().to_vec(),
        }
    }

    pub fn grid(&self) -> &MapGrid {
        &self.grid
    }

    /// The decoded focal plane, if a calibration event has been ingested.
    pub fn focal_plane(&self) -> Option<&FocalPlane> {
        self.focal_plane.as_ref()
    }

    /// Accumulated signal grid, shape `(ny, nx)`.
    pub fn signal_sum(&self) -> &DMatrix<f64> {
        &self.signal_sum
    }

    /// Per-pixel hit counts, shape `(ny, nx)`.
    pub fn hit_count(&self) -> &DMatrix<u64> {
        &self.hit_count
    }
}
