mod stats;

pub use stats::{CategoryCount, TrendPeriod, TrendPoint, TrendSource};
