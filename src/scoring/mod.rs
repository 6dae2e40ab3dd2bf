//! Numbers behind the alternative table: quantifier rollups, per-criteria
//! results and vote tallies.

mod quantifier;
mod rollup;
mod vote;

pub use quantifier::{aggregate_quantifiers, QuantifierTotal};
pub use rollup::{criteria_result, ScoreColumn, ScoreRow, ScoreTable};
pub use vote::{cast_vote, tally, VoteChange};
