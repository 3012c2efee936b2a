//! # Capa de Red
//! src/net/mod.rs
//!
//! Lectura por líneas y escritura completa sobre un socket aceptado.

pub mod connection;

pub use connection::{BufferedConnection, DEFAULT_BUFFER_SIZE};
