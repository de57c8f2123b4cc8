// src/util/mod.rs
pub mod batch;
pub mod csv;
pub mod date;
pub mod text;
pub mod url;
