//! File Picker Controller Library
//!
//! This library provides the core functionality for the File Picker Controller:
//! the `FilePicker` CRD, the reconciler that selects one blob name from an
//! Azure Blob Storage container, and the runtime glue that runs it under
//! `kube-runtime`.
//!
//! ## Quick Start
//!
//! ```rust
//! use file_picker_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod listing;
pub mod observability;
pub mod prelude;
pub mod runtime;
