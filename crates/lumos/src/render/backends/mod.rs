//! Backend implementations
//!
//! - `headless`: records calls without a GPU, used by tests and the sandbox

mod headless;

pub use headless::{BackendCall, HeadlessBackend};
