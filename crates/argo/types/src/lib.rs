//! Argo Workflows schema types
//!
//! The subset of the Argo `v1alpha1` and Kubernetes `core/v1` schema that
//! `argo-dsl` emits. Field names and nesting mirror the engine's template
//! schema exactly, so a serialized [`Template`] can be submitted as-is.
//!
//! # Key Concepts
//!
//! - **Template**: a named unit of work with input parameters and exactly
//!   one manifest (`container`, `script` or `resource`).
//! - **Parameter**: a template input with an optional literal default,
//!   optional enumeration, or an indirect `valueFrom` reference.
//! - **Manifest**: the execution body of a template. Modelled as a closed
//!   enum flattened into the template, which makes "exactly one manifest
//!   kind" a structural property.
//! - **WorkflowStep**: an invocation of a template inside a steps template.
//!   Stages of steps are [`ParallelSteps`].
//!
//! None of these types carry behavior beyond construction helpers and
//! [`Template::validate`]; placeholder expressions inside them are plain text.

#![deny(unsafe_code)]

mod errors;
mod manifest;
mod parameter;
mod steps;
mod template;

pub use errors::*;
pub use manifest::*;
pub use parameter::*;
pub use steps::*;
pub use template::*;
