//! Shared utilities for the viewer.

/// Smoothed frame-rate tracking.
pub mod frame_timing;
