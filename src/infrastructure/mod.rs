// src/infrastructure/mod.rs
pub mod parsers;
