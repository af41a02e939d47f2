// ── Domain model ──

mod entity_id;
mod snapshot;

pub use entity_id::EntityId;
pub use snapshot::{EntityState, StateSnapshot};
