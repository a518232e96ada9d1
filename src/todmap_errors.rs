use thiserror::Error;

#[derive(Error, Debug)]
pub enum TodmapError {
    #[error("Invalid map resolution: {0} (must be strictly positive)")]
    InvalidMapResolution(f64),

    #[error("Map extent {extent} at resolution {res} leaves the {axis} axis with zero pixels")]
    EmptyMapAxis {
        axis: &'static str,
        extent: f64,
        res: f64,
    },

    #[error("Parquet error while decoding the focal plane: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow error while decoding the focal plane: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    #[error("Focal plane column missing or ill-typed: {0}")]
    BadFocalPlaneColumn(String),

    #[error("Focal plane quaternion rows have {0} components (expected 4)")]
    BadQuaternionArity(usize),

    #[error("Focal plane columns have mismatched lengths: {names} names, {quats} quaternions")]
    MismatchedFocalPlaneColumns { names: usize, quats: usize },

    #[error("Focal plane row {0} contains a null entry")]
    NullFocalPlaneEntry(usize),

    #[error("Scan received before any focal-plane calibration")]
    MissingCalibration,

    #[error("Detector '{0}' is not present in the focal plane")]
    UnknownDetector(String),

    #[error("Detector '{detector}' carries {signal} samples but the boresight stream has {boresight}")]
    MismatchedScanLengths {
        detector: String,
        signal: usize,
        boresight: usize,
    },

    #[error("Frame field missing or of unexpected type: {0}")]
    MissingFrameField(String),
}

impl PartialEq for TodmapError {
    fn eq(&self, other: &Self) -> bool {
        use TodmapError::*;
        match (self, other) {
            (InvalidMapResolution(a), InvalidMapResolution(b)) => a == b,
            (
                EmptyMapAxis {
                    axis: a1,
                    extent: e1,
                    res: r1,
                },
                EmptyMapAxis {
                    axis: a2,
                    extent: e2,
                    res: r2,
                },
            ) => a1 == a2 && e1 == e2 && r1 == r2,

            // Source errors are not comparable: equal if same variant
            (ParquetError(_), ParquetError(_)) => true,
            (ArrowError(_), ArrowError(_)) => true,

            (BadFocalPlaneColumn(a), BadFocalPlaneColumn(b)) => a == b,
            (BadQuaternionArity(a), BadQuaternionArity(b)) => a == b,
            (
                MismatchedFocalPlaneColumns {
                    names: n1,
                    quats: q1,
                },
                MismatchedFocalPlaneColumns {
                    names: n2,
                    quats: q2,
                },
            ) => n1 == n2 && q1 == q2,
            (NullFocalPlaneEntry(a), NullFocalPlaneEntry(b)) => a == b,
            (UnknownDetector(a), UnknownDetector(b)) => a == b,
            (
                MismatchedScanLengths {
                    detector: d1,
                    signal: s1,
                    boresight: b1,
                },
                MismatchedScanLengths {
                    detector: d2,
                    signal: s2,
                    boresight: b2,
                },
            ) => d1 == d2 && s1 == s2 && b1 == b2,
            (MissingFrameField(a), MissingFrameField(b)) => a == b,

            // Unit variants
            (MissingCalibration, MissingCalibration) => true,

            _ => false,
        }
    }
}
