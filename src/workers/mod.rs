//! # Sistema de Workers
//! src/workers/mod.rs
//!
//! Pool de threads de tamaño fijo donde cada worker posee un handler
//! reutilizable (en el servidor: una sesión HTTP).

pub mod pool;

pub use pool::{Handler, WorkerPool};
