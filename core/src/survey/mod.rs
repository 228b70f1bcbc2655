pub mod metric;
pub mod point;
pub mod record;

pub use metric::Metric;
pub use point::{Coordinate, Dataset, MeasurementPoint, ScanObservation};
pub use record::{parse_records, RawRecord};
