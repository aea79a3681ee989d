//! Transaction insight HTTP host
//! REST surface the wallet calls before the user signs

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use middleware::start_cleanup_task;
pub use routes::create_router;
pub use types::*;
