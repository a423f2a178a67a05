//! edgeflow-scoring — concurrent candidate scoring for the EdgeFlow
//! scheduling core.
//!
//! One scoring round fans out a worker task per candidate device (local
//! scoring for this host, the scoring RPC for peers), collects reports
//! under a global time budget, and tolerates unresponsive or failing
//! candidates. The ranker then orders whatever the round collected.
//!
//! # Components
//!
//! - **`aggregator`** — the round itself (workers, collector, deadline)
//! - **`ranker`** — stable descending sort of collected scores

pub mod aggregator;
pub mod ranker;

pub use aggregator::{ScoreAggregator, ScoringPolicy};
pub use ranker::rank;
