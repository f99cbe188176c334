//! Daily activity metrics: distance, active time and top speed.

mod aggregator;
mod daily;
mod geo;

pub use aggregator::{MetricsAggregator, MetricsSource, MetricsUpdate, SampleOutcome};
pub use daily::{DailyMetrics, METRICS_RECORD_LEN, METRICS_VERSION};
pub use geo::haversine_m;
