// src/services/mod.rs

pub mod auth;
pub mod content;
pub mod mail;
