pub mod evaluation;
pub mod ordering;
pub mod remote;
pub mod search;
pub mod tt;

pub use evaluation::{Evaluate, StaticEvaluator};
pub use remote::RemoteEvaluator;
pub use search::{SearchParams, SearchStats, Searcher};
pub use tt::TranspositionTable;
