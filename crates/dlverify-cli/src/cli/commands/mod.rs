//! CLI command handlers, one file per command.

mod digest;
mod drive;
mod replay;
mod scan;
mod verify;

pub use digest::{digest_file, run_digest};
pub use drive::drive_events;
pub use replay::{parse_events, run_replay};
pub use scan::{run_scan, scan_file};
pub use verify::{run_verify, verify_download};
