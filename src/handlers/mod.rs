// src/handlers/mod.rs
pub mod chat;
pub mod error;
pub mod script;
pub mod status;
pub mod storyboard;
