//! Video transcription.
//!
//! The audio track is pulled out of the video with ffmpeg, split into pieces
//! under the API upload limit, and each piece is sent to OpenAI Whisper. Piece
//! transcripts are joined in playback order.

mod whisper;

pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the spoken audio of a video file.
    ///
    /// A video without an audio track yields an empty transcript.
    async fn transcribe(&self, video_path: &Path) -> Result<String>;
}

/// Joins piece transcripts with single spaces, skipping empty pieces.
pub fn join_pieces<I, S>(pieces: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pieces
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
