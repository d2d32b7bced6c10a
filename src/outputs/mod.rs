//! Output generation for search results.
//!
//! # Submodules
//!
//! - [`json`]: Writes and reloads [`SearchReport`](crate::models::SearchReport) files
//! - [`markdown`]: Renders a digest with the topic distribution and item table
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── acme_203000.json
//!
//! markdown_output_dir/
//! └── 2025-05-06_acme_203000.md
//! ```

pub mod json;
pub mod markdown;
