//! # Constants and type definitions for todmap
//!
//! This module centralizes the **unit type aliases**, **frame field names**, and
//! **common container types** used throughout the `todmap` library.
//!
//! ## Overview
//!
//! - Angular unit aliases used by the map grid and pointing code
//! - Detector identifiers and detector-keyed containers
//! - The fixed field names of the frame boundary contract
//!
//! These definitions are used by all main modules, including the map grid,
//! focal-plane calibration, and the map-making accumulator.

use std::collections::HashMap;

use ahash::RandomState;
use nalgebra::UnitQuaternion;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Identifier of a single detector on the focal plane
pub type DetectorId = String;

/// Per-detector raw signal streams, one sample sequence per detector
pub type SignalMap = HashMap<DetectorId, Vec<f64>, RandomState>;

/// Lookup table from detector id to its fixed angular offset on the focal plane
pub type DetectorQuats = HashMap<DetectorId, UnitQuaternion<f64>, RandomState>;

// -------------------------------------------------------------------------------------------------
// Frame boundary field names
// -------------------------------------------------------------------------------------------------

/// Calibration frame field holding the serialized focal-plane table
pub const FOCALPLANE_FIELD: &str = "focalplane";

/// Scan frame field holding the per-detector raw signal streams
pub const SIGNAL_FIELD: &str = "signal";

/// Scan frame field holding the boresight orientation stream (one
/// scalar-first quaternion per time sample)
pub const BORESIGHT_FIELD: &str = "shared_boresight_radec";

/// One full turn of right ascension, in degrees
pub const RA_TURN: Degree = 360.0;
