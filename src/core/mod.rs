// src/core/mod.rs
pub mod engine;
pub mod phrase;
pub mod rules;
pub mod tail;
pub mod types;
