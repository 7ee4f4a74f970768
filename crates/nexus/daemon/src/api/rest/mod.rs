//! REST API over the governance loop

pub mod handlers;
pub mod router;
pub mod state;
