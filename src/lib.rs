//! # todmap
//!
//! Map-making stage for a streamed telescope data pipeline: reduces
//! multi-detector time-ordered data into a binned 2D sky-intensity map with
//! per-pixel hit counts.
//!
//! The stage consumes three kinds of events, in delivery order: a focal-plane
//! calibration table, any number of scan batches (raw signal plus a boresight
//! orientation stream), and an end-of-stream marker that finalizes the map.
//! See [`mapmaker::MapMaker`] for the accumulator and [`pipeline`] for the
//! frame-dispatch boundary.

pub mod constants;
pub mod focal_plane;
pub mod frame;
pub mod map_grid;
pub mod mapmaker;
pub mod pipeline;
pub mod pointing;
pub mod todmap_errors;
