//! # Frame boundary model
//!
//! The upstream streaming framework pushes discrete *frames*: a type tag plus
//! named fields. This module gives that boundary an explicit, typed shape so
//! the dispatch adapter in [`pipeline`](crate::pipeline) can route each frame
//! without the accumulator knowing anything about the delivery mechanism.
//!
//! Field names are fixed by the upstream contract: `focalplane` on
//! calibration frames; `signal`, `shared_boresight_radec`, and the optional
//! `compress_signal_<id>_gain` / `compress_signal_<id>_offset` scalar pairs
//! on scan frames.

use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;

use crate::constants::{DetectorId, SignalMap, BORESIGHT_FIELD, FOCALPLANE_FIELD, SIGNAL_FIELD};
use crate::mapmaker::{Compression, ScanBatch};
use crate::todmap_errors::TodmapError;

/// Frame type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Calibration,
    Scan,
    EndProcessing,
    /// Any frame type the map-making stage does not consume (pass-through).
    Other,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameKind::Calibration => "Calibration",
            FrameKind::Scan => "Scan",
            FrameKind::EndProcessing => "EndProcessing",
            FrameKind::Other => "Other",
        };
        write!(f, "{name}")
    }
}

/// One named field of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameValue {
    /// Opaque serialized payload (e.g. the focal-plane table).
    Bytes(Vec<u8>),
    /// A single numeric field.
    Scalar(f64),
    /// A stream of scalar-first `[w, x, y, z]` quaternions.
    Quaternions(Vec<[f64; 4]>),
    /// Per-detector raw signal streams.
    Signal(SignalMap),
}

/// One discrete unit of streamed data: a type tag and named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub kind: FrameKind,
    fields: HashMap<String, FrameValue, RandomState>,
}

impl Frame {
    pub fn new(kind: FrameKind) -> Self {
        Frame {
            kind,
            fields: HashMap::default(),
        }
    }

    /// A calibration frame carrying the serialized focal-plane table.
    pub fn calibration(focal_plane_blob: Vec<u8>) -> Self {
        let mut frame = Frame::new(FrameKind::Calibration);
        frame.insert(FOCALPLANE_FIELD, FrameValue::Bytes(focal_plane_blob));
        frame
    }

    /// A scan frame carrying signal streams and the boresight stream.
    pub fn scan(signal: SignalMap, boresight: Vec<[f64; 4]>) -> Self {
        let mut frame = Frame::new(FrameKind::Scan);
        frame.insert(SIGNAL_FIELD, FrameValue::Signal(signal));
        frame.insert(BORESIGHT_FIELD, FrameValue::Quaternions(boresight));
        frame
    }

    pub fn end_processing() -> Self {
        Frame::new(FrameKind::EndProcessing)
    }

    pub fn other() -> Self {
        Frame::new(FrameKind::Other)
    }

    pub fn insert(&mut self, name: &str, value: FrameValue) {
        self.fields.insert(name.to_string(), value);
    }

    /// Attach affine decompression parameters for one detector, using the
    /// `compress_signal_<id>_gain` / `compress_signal_<id>_offset` field
    /// naming scheme.
    pub fn with_compression(mut self, detector: &str, compression: Compression) -> Self {
        self.insert(
            &compression_gain_field(detector),
            FrameValue::Scalar(compression.gain),
        );
        self.insert(
            &compression_offset_field(detector),
            FrameValue::Scalar(compression.offset),
        );
        self
    }

    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        match self.fields.get(name) {
            Some(FrameValue::Bytes(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            Some(FrameValue::Scalar(x)) => Some(*x),
            _ => None,
        }
    }

    pub fn quaternions(&self, name: &str) -> Option<&[[f64; 4]]> {
        match self.fields.get(name) {
            Some(FrameValue::Quaternions(q)) => Some(q.as_slice()),
            _ => None,
        }
    }

    pub fn signal(&self, name: &str) -> Option<&SignalMap> {
        match self.fields.get(name) {
            Some(FrameValue::Signal(s)) => Some(s),
            _ => None,
        }
    }

    /// Copy this scan frame's payload into a [`ScanBatch`].
    ///
    /// Per-call inputs are copied out of the frame, so the reduction never
    /// aliases frame storage. Decompression parameters are picked up for a
    /// detector only when **both** its gain and offset fields are present.
    ///
    /// Return
    /// ------
    /// * The batch, or [`TodmapError::MissingFrameField`] if the signal or
    ///   boresight field is absent or ill-typed.
    pub fn scan_batch(&self) -> Result<ScanBatch, TodmapError> {
        let signal = self
            .signal(SIGNAL_FIELD)
            .ok_or_else(|| TodmapError::MissingFrameField(SIGNAL_FIELD.to_string()))?;
        let boresight = self
            .quaternions(BORESIGHT_FIELD)
            .ok_or_else(|| TodmapError::MissingFrameField(BORESIGHT_FIELD.to_string()))?;

        let mut compression: HashMap<DetectorId, Compression, RandomState> = HashMap::default();
        for detector in signal.keys() {
            let gain = self.scalar(&compression_gain_field(detector));
            let offset = self.scalar(&compression_offset_field(detector));
            if let (Some(gain), Some(offset)) = (gain, offset) {
                compression.insert(detector.clone(), Compression { gain, offset });
            }
        }

        Ok(ScanBatch {
            boresight: boresight.to_vec(),
            signal: signal.clone(),
            compression,
        })
    }
}

fn compression_gain_field(detector: &str) -> String {
    format!("compress_signal_{detector}_gain")
}

fn compression_offset_field(detector: &str) -> String {
    format!("compress_signal_{detector}_offset")
}
