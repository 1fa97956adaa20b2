//! Shared utility modules used across Sylva components.

pub mod version;
