//! Command handlers

pub mod config;
pub mod inspect;
pub mod replay;
