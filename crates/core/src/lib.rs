//! # MentorMeet Core
//!
//! Domain types for the mentorship meeting scheduler: slots, meetings, the
//! meeting state machine, and the shared error taxonomy. This crate performs
//! no I/O; persistence and transport live in the `db` and `api` crates.

pub mod errors;
pub mod models;
