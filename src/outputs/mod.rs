//! Output generation for the ranked chart.
//!
//! # Submodules
//!
//! - [`json`]: Writes a [`Chart`](crate::models::Chart) to disk or stdout
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2026-10-16/
//! │   ├── albums.json
//! │   └── tracks.json
//! ```

pub mod json;
