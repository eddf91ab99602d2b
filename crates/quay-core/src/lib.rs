#![forbid(unsafe_code)]

//! Geometric primitives shared by the quay layout crates.

pub mod geometry;

pub use geometry::{Point, Rect, Size};
