pub mod bounds;
pub mod features;
pub mod table;
pub mod tensor;
pub mod text;

pub use bounds::{read_roi_bounds, RoiTableSpec};
pub use features::{read_feature_events, read_numeric_columns, FeatureTableSpec};
pub use table::Delimiter;
pub use tensor::{read_trial_tensor, write_trial_tensor, TrialTensorRecord};
pub use text::{read_f64_series, write_f64_series};
