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

//! Single-model 3D viewer built on wgpu.
//!
//! Modelview loads one glTF or OBJ/MTL model, frames the camera around it,
//! and lets the user orbit, pan and dolly around the result while a status
//! label reports load progress.
//!
//! # Key entry points
//!
//! - [`viewport::Viewport`] - the per-session state object (camera, orbit
//!   controls, scene, light rig, load status)
//! - [`camera::framing::frame_area`] - camera auto-framing of a bounding box
//! - [`loader::load_model`] - async model loading with progress events
//! - [`progress::ProgressReporter`] - load progress to status text
//! - [`options::Options`] - tunables (camera, lights, display, model source)
//!
//! # Architecture
//!
//! All session state lives on one thread. Model loading is a single async
//! operation whose progress and completion arrive as
//! [`loader::LoadEvent`]s on a channel, drained by the viewport at the top
//! of each frame. The GPU side is a single lit mesh pass
//! ([`renderer::MeshRenderer`]) fed from the CPU scene graph.
//!
//! Two hosts drive a viewport: the winit desktop window (`viewer` feature)
//! and a browser canvas (`web` feature).

pub mod bounds;
pub mod camera;
pub mod error;
pub mod gpu;
pub mod input;
pub mod loader;
pub mod options;
pub mod progress;
pub mod renderer;
pub mod scene;
pub mod viewport;

#[cfg(feature = "viewer")]
pub mod viewer;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use error::ViewerError;
pub use input::{InputEvent, MouseButton};
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
pub use viewport::Viewport;
