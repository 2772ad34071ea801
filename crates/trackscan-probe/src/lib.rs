//! # trackscan-probe
//!
//! Track metadata probing through an external identification tool.
//!
//! The [`Prober`] trait is the seam the scan pipeline talks to; the
//! [`MkvmergeProber`] backend runs `mkvmerge -J` under a timeout through
//! [`ToolCommand`]. Probe failures never propagate as errors past
//! [`probe_record`]: they become [`ProbeResult::Failed`] rows.
//!
//! ## Quick start
//!
//! ```no_run
//! use trackscan_probe::{MkvmergeProber, Prober};
//! use trackscan_core::ProbeConfig;
//! use std::path::Path;
//!
//! let prober = MkvmergeProber::from_config(&ProbeConfig::default()).unwrap();
//! for track in prober.probe(Path::new("movie.mkv")).unwrap() {
//!     println!("{} {} {}", track.track_type, track.codec, track.language_or_und());
//! }
//! ```

pub mod command;
pub mod mkvmerge;
pub mod prober;
pub mod tools;
pub mod types;

pub use command::{CommandError, ToolCommand, ToolOutput};
pub use mkvmerge::MkvmergeProber;
pub use prober::{failure_reason, probe_record, Prober, FILE_MISSING};
pub use tools::{check_tool, get_tool_path, ToolInfo};
pub use types::{ProbeResult, NO_TRACK_DATA};
