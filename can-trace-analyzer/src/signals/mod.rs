//! Message definition database and DBC parser
//!
//! Definitions are loaded into a [`SignalDatabase`] and consumed through the
//! [`SignalDecoder`](crate::SignalDecoder) implementation in
//! [`crate::signal_decoder`].

pub mod dbc;
pub mod database;

// Re-export key types for convenience
pub use database::{
    ByteOrder, DatabaseStats, MessageDefinition, MultiplexerInfo, SignalDatabase,
    SignalDefinition, ValueType,
};
