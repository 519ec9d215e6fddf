//! Element-level assembly of two-field systems.
//!
//! Element kernels accumulate quadrature point contributions into a [`LocalSystem`](local::LocalSystem).
//! The local system is then scattered into a [`GlobalSystem`](global::GlobalSystem) honoring the
//! degree-of-freedom elimination map. Scratch storage is kept in [`ElementBuffers`](buffers::ElementBuffers),
//! which are reused across elements but never carry state from one element to the next.
pub mod buffers;
pub mod global;
pub mod local;

pub use buffers::*;
pub use global::*;
pub use local::*;
