//! Matchmaking queue client
//!
//! A thin state machine over the shared connection: join/leave the queue,
//! poll its status, and mirror the server-pushed membership list.

pub mod client;

pub use client::QueueClient;
