//! Per-room live view
//!
//! A `RoomChannel` binds to one room's message stream at a time and exposes
//! the chat actions for it. The bind/unbind pair is callable from any UI
//! framework's mount/unmount or dispose hook; nothing here depends on a
//! particular UI binding mechanism.

pub mod channel;

pub use channel::{RoomBinding, RoomChannel};
