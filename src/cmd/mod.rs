//! CLI command implementations.
//!
//! | Module     | Commands handled              |
//! |------------|-------------------------------|
//! | `generate` | `Generate`, `Watch`, `Validate` |

pub mod generate;

pub use generate::{cmd_generate, cmd_validate, cmd_watch};
