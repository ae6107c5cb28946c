//! Staged-write overlay over a key/value store.
//!
//! An [`Overlay`] borrows a base [`MapStore`] and records sets and deletes in
//! a private staging store. Reads see the staged edits at once; the base is
//! only written on [`Overlay::commit`], and [`Overlay::discard`] throws the
//! batch away.

pub mod error;
pub mod mem;
pub mod overlay;
#[cfg(feature = "sled")]
pub mod sled_store;
pub mod traits;

pub use error::{OverlayError, Result};
pub use mem::InMemoryMap;
pub use overlay::{Iter, Keys, Overlay, Staged};
#[cfg(feature = "sled")]
pub use sled_store::{SledKeys, SledMap};
pub use traits::MapStore;
