//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `audit` - Audit stages, typed fields, heuristic extraction and reply parsing

pub mod audit;
