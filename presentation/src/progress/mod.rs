//! Live mission progress

pub mod reporter;
