use std::sync::Arc;

use arrow_array::{FixedSizeListArray, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;

use todmap::constants::SignalMap;
use todmap::frame::Frame;

/// Serialize a focal-plane table (detector id, vector-first `[x, y, z, w]`
/// offset quaternion) to Parquet bytes, the way the upstream calibration
/// writer does.
pub fn focal_plane_blob(rows: &[(&str, [f64; 4])]) -> Vec<u8> {
    let names = StringArray::from(rows.iter().map(|(n, _)| *n).collect::<Vec<_>>());
    let flat: Vec<f64> = rows.iter().flat_map(|(_, q)| q.to_vec()).collect();
    let item = Arc::new(Field::new("item", DataType::Float64, false));
    let quats = FixedSizeListArray::new(item.clone(), 4, Arc::new(Float64Array::from(flat)), None);

    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("quat", DataType::FixedSizeList(item, 4), false),
    ]));
    let batch =
        RecordBatch::try_new(schema.clone(), vec![Arc::new(names), Arc::new(quats)]).unwrap();

    let mut out = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut out, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    out
}

/// A scan frame with one detector, one sample per boresight quaternion.
pub fn single_detector_scan(id: &str, boresight: Vec<[f64; 4]>, samples: Vec<f64>) -> Frame {
    let mut signal = SignalMap::default();
    signal.insert(id.to_string(), samples);
    Frame::scan(signal, boresight)
}
