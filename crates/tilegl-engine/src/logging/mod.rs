//! Logger setup for tilegl hosts.
//!
//! Render controllers emit through the `log` facade with a backend prefix
//! (`soft:` / `gpu:`): lifecycle at info, texture churn at debug, state diffs
//! at trace. A host that already installed its own logger can skip this
//! module entirely; `tilegl-snapshot` and the test-suite call it.

mod init;

pub use init::{init_logging, LoggingConfig};
