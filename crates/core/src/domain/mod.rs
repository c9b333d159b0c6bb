pub mod headline;
pub mod market;
pub mod signal;

pub use headline::{HeadlineRecord, ScoredHeadline};
pub use market::{DailyReturn, PriceHistory, PricePoint};
pub use signal::{Direction, Signal};
