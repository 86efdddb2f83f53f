// src/models/mod.rs

pub mod attempt;
