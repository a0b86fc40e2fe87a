//! Card persistence.
//!
//! The [`CardStore`] trait is the seam every backend implements. Only the
//! in-memory backend ships; file-backed configurations fall back to it.

pub mod memory;
mod traits;
mod types;

pub use memory::MemoryStore;
pub use traits::CardStore;
pub use types::StoredCard;
