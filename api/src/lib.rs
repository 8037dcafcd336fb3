pub mod api;
pub mod config;
pub mod gemini;
pub mod judge0;
pub mod languages;
