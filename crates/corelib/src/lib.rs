//! Core library for the consistent-hashing placement ring.
//!
//! This crate provides the fundamental abstractions the rest of the
//! workspace is built on:
//! - A fixed, seeded 64-bit [`hash`] primitive
//! - [`Node`] identity and weight
//! - The weighted virtual-node [`Ring`] itself: lookup, multi-replica
//!   selection, and safe concurrent mutation
//! - [`Topology`], a read-only view for inspecting ring ownership
//!
//! Placement routing, rebalance planning, and concrete backend adapters live
//! in sibling crates (`router`, `rebalance`, `adapters`) built on top of this
//! one.

pub mod error;
pub mod hash;
pub mod node;
pub mod ring;
pub mod topology;

pub use error::{Error, Result};
pub use node::Node;
pub use ring::{Ring, RingStats};
pub use topology::Topology;
