// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Interactive 3D comparison of a healthy and a polycystic kidney.
//!
//! Nephroview loads a glTF model for the selected kidney variant, normalizes
//! it into a canonical viewing box, recolors it by health state, and renders
//! it with wgpu under an orbiting camera. When a model cannot be loaded a
//! procedural stand-in (ellipsoid body plus random cysts for the
//! pathological variant) is shown instead.
//!
//! # Key entry points
//!
//! - [`controller::ViewController`] - display state, load dispatch and the
//!   scene composer; fully usable without a GPU
//! - [`engine::KidneyEngine`] - wgpu renderer driving a `ViewController`
//! - [`render_loop::FrameLoop`] - cancellable per-frame task
//! - [`options::Options`] - runtime configuration (camera, lighting, colors,
//!   asset location, key bindings)
//! - [`presentation`] - descriptive text shown next to the viewport
//!
//! # Architecture
//!
//! Models load on a background [`loader::LoadWorker`] thread. Every request
//! carries a generation number; outcomes arrive through a lock-free triple
//! buffer and are only applied if they still match the latest generation,
//! so a slow load for a since-abandoned state never replaces the current
//! organ.

pub mod camera;
pub mod controller;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod input;
pub mod loader;
pub mod options;
pub mod presentation;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod state;
pub mod util;

#[cfg(feature = "gui")]
pub(crate) mod gui;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use controller::ViewController;
pub use engine::command::ViewCommand;
pub use engine::KidneyEngine;
pub use error::NephroError;
pub use input::{InputEvent, MouseButton};
pub use state::DisplayState;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
