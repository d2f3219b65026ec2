pub mod correlation;

pub use correlation::{correlate_features, min_max_normalize, pearson, CorrelationPair, FeatureColumn};
