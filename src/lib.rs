//! Plinth: a personal portfolio backend.
//!
//! Layering follows the dependency arrow inward: `infra` adapts the outside
//! world (Postgres, GitHub, mail, disk, HTTP) to traits that `application`
//! services consume, and `domain` holds the pure types and rules both depend
//! on.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
