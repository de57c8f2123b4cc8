// src/domain/mod.rs
pub mod error;
pub mod item;
pub mod parse_result;
pub mod tag;
