//! A growable, reference-counted element buffer with an explicit, documented
//! block layout and read-only introspection of its header and payload.
//!
//! # Modules
//!
//! - [`buffer`]: [`GrowableArrayBuffer`], the buffer handle
//! - [`layout`]: header and payload layout of a buffer block
//! - [`refcount`]: single-threaded and atomic reference count flavours
//! - [`introspect`]: element enumeration and header snapshots
//! - [`options`]: construction options and growth policies

pub mod align;
pub mod buffer;
pub mod introspect;
pub mod layout;
pub mod options;
pub mod refcount;

pub use buffer::{GrowableArrayBuffer, SharedArrayBuffer};
pub use introspect::{HeaderSnapshot, Introspect, MemoryAllocation};
pub use options::{BufferOptions, GrowthPolicy};
pub use refcount::{AtomicRefCount, LocalRefCount, RefCount};
