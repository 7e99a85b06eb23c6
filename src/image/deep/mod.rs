//! Deep data utilities and operations.
//!
//! This module provides utilities for working with deep data in OpenEXR files.
//! Deep data allows multiple samples per pixel at different depths, useful for
//! rendering applications that need to store volumetric data, multiple layers,
//! or depth-dependent information.

pub mod compositing;
pub mod flatten;
pub mod merge;
