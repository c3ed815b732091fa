//! Shared utility modules used across filesift components.

pub mod similarity;
