//! Reconstructs an approximate 3D head surface from facial landmarks.
//!
//! Each bounded context keeps its interfaces under `domain/` and its concrete
//! backends under `infrastructure/`. The `pipeline` module wires them into the
//! image and video use cases.

pub mod landmarks;
pub mod mesh;
pub mod overlay;
pub mod pipeline;
pub mod reconstruction;
pub mod shared;
pub mod video;
