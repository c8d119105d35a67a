//! Core types and trait definitions for the household suggestion engine.
//!
//! Holds the domain model, the pure matching and ranking rules, and the traits
//! that storage backends and external collaborators implement. No HTTP or
//! database code lives here.

#![allow(async_fn_in_trait)]

pub mod classify;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod household;
pub mod match_type;
pub mod name;
pub mod pattern;
pub mod person;
pub mod rank;
pub mod store;

pub use error::{Error, Result};
