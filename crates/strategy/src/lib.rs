pub mod classifier;
pub mod indicators;
pub mod levels;

pub use classifier::{classify, tally, Votes};
pub use indicators::{IndicatorSet, Snapshot};
pub use levels::entry_levels;
