//! Core business logic for pitchboard.
//!
//! Services own the rules: who may do what, how votes and ratings keep the
//! project counters consistent, and how read models are assembled.

pub mod services;

pub use services::*;
