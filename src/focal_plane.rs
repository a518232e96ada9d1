//! # Focal-plane calibration table
//!
//! The calibration stream delivers the focal plane as a self-describing
//! binary blob: a Parquet table with a `name` column (detector id, UTF-8) and
//! a `quat` column (4 × f64 per row, vector-first `[x, y, z, w]`). This
//! module decodes that blob into an in-memory lookup table from detector id
//! to fixed offset rotation.

use bytes::Bytes;
use log::debug;
use nalgebra::UnitQuaternion;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use arrow_array::{Array, FixedSizeListArray, Float64Array, StringArray};

use crate::constants::{DetectorId, DetectorQuats};
use crate::pointing::offset_from_wire;
use crate::todmap_errors::TodmapError;

/// Detector-id → fixed-offset-rotation table, decoded once per calibration
/// event and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocalPlane {
    offsets: DetectorQuats,
}

impl FocalPlane {
    /// Decode a focal-plane table from a serialized Parquet blob.
    ///
    /// Arguments
    /// ---------
    /// * `blob`: the raw bytes of a Parquet file with a `name` (Utf8) column
    ///   and a `quat` (FixedSizeList of 4 Float64) column.
    ///
    /// Return
    /// ------
    /// * The decoded table, or a [`TodmapError`] if the blob is malformed,
    ///   a column is missing or ill-typed, quaternion rows do not carry 4
    ///   components, or any row is null.
    pub fn from_parquet_bytes(blob: &[u8]) -> Result<Self, TodmapError> {
        let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(blob))?
            .build()?;

        let mut offsets: DetectorQuats = DetectorQuats::default();
        for maybe_batch in reader {
            let batch = maybe_batch?;

            let names = batch
                .column_by_name("name")
                .and_then(|col| col.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| TodmapError::BadFocalPlaneColumn("name".to_string()))?;

            let quats = batch
                .column_by_name("quat")
                .and_then(|col| col.as_any().downcast_ref::<FixedSizeListArray>())
                .ok_or_else(|| TodmapError::BadFocalPlaneColumn("quat".to_string()))?;

            if quats.value_length() != 4 {
                return Err(TodmapError::BadQuaternionArity(quats.value_length() as usize));
            }
            if names.len() != quats.len() {
                return Err(TodmapError::MismatchedFocalPlaneColumns {
                    names: names.len(),
                    quats: quats.len(),
                });
            }

            for row in 0..names.len() {
                if names.is_null(row) || quats.is_null(row) {
                    return Err(TodmapError::NullFocalPlaneEntry(row));
                }
                let cell = quats.value(row);
                let components = cell
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| TodmapError::BadFocalPlaneColumn("quat".to_string()))?;
                if components.null_count() != 0 {
                    return Err(TodmapError::NullFocalPlaneEntry(row));
                }

                let wire = [
                    components.value(0),
                    components.value(1),
                    components.value(2),
                    components.value(3),
                ];
                offsets.insert(names.value(row).to_string(), offset_from_wire(&wire));
            }
        }

        debug!("decoded focal plane with {} detectors", offsets.len());
        Ok(FocalPlane { offsets })
    }

    /// Fixed offset rotation of a detector, if it is part of the focal plane.
    pub fn offset(&self, detector: &str) -> Option<&UnitQuaternion<f64>> {
        self.offsets.get(detector)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Detector ids in sorted order.
    pub fn detector_names(&self) -> Vec<&DetectorId> {
        let mut names: Vec<&DetectorId> = self.offsets.keys().collect();
        names.sort_unstable();
        names
    }
}


#[cfg(test)]
mod focal_plane_test {
    use super::test_support::{focal_plane_blob, focal_plane_blob_with_arity};
    use super::*;

    use std::sync::Arc;

    use arrow_array::RecordBatch;
    use arrow_schema::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;

    #[test]
    fn test_decode_round_trip() {
        let blob = focal_plane_blob(&[
            ("kid_000", [0.0, 0.0, 0.0, 1.0]),
            ("kid_001", [0.5, 0.5, 0.5, 0.5]),
        ]);
        let fp = FocalPlane::from_parquet_bytes(&blob).unwrap();

        assert_eq!(fp.len(), 2);
        assert_eq!(fp.detector_names(), ["kid_000", "kid_001"]);
        assert_eq!(
            fp.offset("kid_000"),
            Some(&UnitQuaternion::identity()),
        );
        assert_eq!(
            fp.offset("kid_001"),
            Some(&offset_from_wire(&[0.5, 0.5, 0.5, 0.5])),
        );
        assert_eq!(fp.offset("kid_404"), None);
    }

    #[test]
    fn test_empty_table_decodes_empty() {
        let blob = focal_plane_blob(&[]);
        let fp = FocalPlane::from_parquet_bytes(&blob).unwrap();
        assert!(fp.is_empty());
    }

    #[test]
    fn test_garbage_blob_is_rejected() {
        let err = FocalPlane::from_parquet_bytes(b"not a parquet file").unwrap_err();
        assert!(matches!(err, TodmapError::ParquetError(_)));
    }

    #[test]
    fn test_wrong_quaternion_arity() {
        let blob = focal_plane_blob_with_arity(&[("kid_000", [0.0, 0.0, 0.0, 1.0])], 3);
        assert_eq!(
            FocalPlane::from_parquet_bytes(&blob),
            Err(TodmapError::BadQuaternionArity(3))
        );
    }

    #[test]
    fn test_missing_column() {
        // A table with only a name column
        let names = StringArray::from(vec!["kid_000"]);
        let schema = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(names)]).unwrap();
        let mut out = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut out, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        assert_eq!(
            FocalPlane::from_parquet_bytes(&out),
            Err(TodmapError::BadFocalPlaneColumn("quat".to_string()))
        );
    }
}
