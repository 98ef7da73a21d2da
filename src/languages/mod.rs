// Language aggregation module
// Author: kelexine (https://github.com/kelexine)

mod aggregator;
mod colors;

pub use aggregator::{aggregate, select, summarize};
pub use colors::language_color;
