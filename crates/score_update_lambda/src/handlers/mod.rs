pub mod invocation;
pub mod update_score;
