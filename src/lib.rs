//! Audit Assistant - Guided energy audit conversation
//!
//! Collects a user's profile, energy consumption and property details in
//! three stages. Replies come from a language model when one is reachable
//! and from a rule-based simulator otherwise.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
