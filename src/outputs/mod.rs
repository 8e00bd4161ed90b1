//! Output generation for validated predictions.
//!
//! # Submodules
//!
//! - [`json`]: Writes the validated prediction list to a single JSON file
//!
//! # Output Structure
//!
//! ```text
//! validated_predictions.json   # overwritten on every run
//! ```

pub mod json;
