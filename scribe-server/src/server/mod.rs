pub mod expire;
pub mod handlers;
pub mod metrics_handler;
pub mod router;

pub use expire::{DEFAULT_EXPIRE_INTERVAL, start_expirer};
pub use handlers::AppState;
pub use metrics_handler::init_metrics;
pub use router::create_router;
