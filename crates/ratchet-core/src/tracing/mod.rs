//! Observability for the ratchet engine.
//! `tracing` with an `EnvFilter` driven by `RATCHET_LOG`.

pub mod setup;

pub use setup::init_tracing;
