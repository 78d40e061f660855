//! Audio processing utilities.
//!
//! Extracts audio from uploaded videos and splits it into pieces small
//! enough for the transcription API, using ffmpeg and ffprobe.

mod ffmpeg;

pub use ffmpeg::{extract_audio, has_audio_stream, piece_seconds, probe_duration, split_by_size};
