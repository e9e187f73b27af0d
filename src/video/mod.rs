//! Video processing utilities.
//!
//! This module provides frame sampling and clip trimming over ffmpeg,
//! plus duration probing via ffprobe.

mod clips;
mod frames;

pub use clips::{clip_output_path, extract_clip, probe_duration};
pub use frames::{extract_frames, Frame};
