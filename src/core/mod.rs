// src/core/mod.rs

pub mod newick;
pub mod projection;
pub mod tree;
pub mod types;
