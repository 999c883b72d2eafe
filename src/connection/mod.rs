//! Connection ownership and lifecycle
//!
//! The manager owns the shared transport session and its state machine;
//! everything else (queue client, room channels) reads state through
//! change notifications and sends through the manager.

pub mod config;
pub mod manager;
pub mod state;

pub use config::ClientConfig;
pub use manager::ConnectionManager;
pub use state::ConnectionState;
