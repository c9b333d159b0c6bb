pub mod blend;
pub mod filter;
pub mod returns;
pub mod sentiment;

pub use blend::Blender;
pub use filter::{filter_recent, NewsWindow};
pub use returns::{ReturnConfig, ReturnStats};
pub use sentiment::{aggregate_sentiment, Lexicon};
