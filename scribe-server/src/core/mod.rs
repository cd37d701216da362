pub mod cache;
pub mod entity;
pub mod error;
pub mod ids;

pub use cache::{DEFAULT_FLUSH_INTERVAL, PENDING_GAUGE, WriteBehindCache};
pub use entity::{Entity, EntityRequest, MAX_CONTENT_LEN, MAX_CREATE_USER_LEN};
pub use error::ScribeError;
pub use ids::{IdGenerator, UuidGenerator};
