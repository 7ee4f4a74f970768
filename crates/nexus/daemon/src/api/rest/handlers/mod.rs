//! API request handlers

mod audit;
mod governance;
mod health;
mod logs;

pub use audit::*;
pub use governance::*;
pub use health::*;
pub use logs::*;

use serde::Deserialize;

/// `?limit=` query shared by the list endpoints
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}
