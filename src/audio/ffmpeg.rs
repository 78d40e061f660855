//! Audio extraction and splitting with ffmpeg/ffprobe.

use crate::error::{DocqaError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Extracts the audio track of a video as MP3.
///
/// Returns `false` without writing anything when the video has no audio stream.
#[instrument(skip_all, fields(video = %video.display()))]
pub async fn extract_audio(video: &Path, dest: &Path) -> Result<bool> {
    if !has_audio_stream(video).await? {
        warn!("No audio track found in the video");
        return Ok(false);
    }

    let result = Command::new("ffmpeg")
        .arg("-i").arg(video)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-acodec").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => {
            info!("Audio extracted to {:?}", dest);
            Ok(true)
        }
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(DocqaError::ToolFailed(format!("ffmpeg audio extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DocqaError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(DocqaError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Seconds of audio per piece so that each piece stays under `max_bytes`.
///
/// Assumes a constant bitrate across the file.
pub fn piece_seconds(total_bytes: u64, max_bytes: u64, total_seconds: f64) -> f64 {
    if total_bytes == 0 || total_bytes <= max_bytes {
        return total_seconds;
    }
    (max_bytes as f64 / total_bytes as f64 * total_seconds).min(total_seconds)
}

/// Splits an audio file into pieces no larger than `max_bytes`.
///
/// Returns the piece paths in playback order. A file already small enough is
/// returned as-is.
#[instrument(skip_all)]
pub async fn split_by_size(source: &Path, output_dir: &Path, max_bytes: u64) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let total_bytes = std::fs::metadata(source)?.len();
    if total_bytes <= max_bytes {
        return Ok(vec![source.to_path_buf()]);
    }

    let total_duration = probe_duration(source).await?;
    let piece_len = piece_seconds(total_bytes, max_bytes, total_duration);
    if piece_len <= 0.0 {
        return Err(DocqaError::Transcription("audio has no measurable duration".into()));
    }

    info!(
        "Splitting {:.1} MB / {:.1}s of audio into ~{:.1}s pieces",
        total_bytes as f64 / (1024.0 * 1024.0),
        total_duration,
        piece_len
    );

    let mut pieces = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let piece_path = output_dir.join(format!("chunk_{:03}.mp3", idx));
        let length = piece_len.min(total_duration - offset);

        extract_segment(source, &piece_path, offset, length).await?;

        debug!("Created piece {} at offset {:.1}s", idx, offset);
        pieces.push(piece_path);

        offset += piece_len;
        idx += 1;
    }

    info!("Created {} audio pieces", pieces.len());
    Ok(pieces)
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    // First attempt: stream copy (fast, no quality loss)
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(DocqaError::ToolFailed(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DocqaError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(DocqaError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Runs ffprobe with JSON output and parses the result.
async fn ffprobe_json(args: &[&str], path: &Path) -> Result<serde_json::Value> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .args(args)
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DocqaError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(DocqaError::ToolFailed(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(DocqaError::ToolFailed(format!(
            "ffprobe could not read {}",
            path.display()
        )));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|_| DocqaError::ToolFailed("Invalid ffprobe output".into()))
}

/// Queries the duration of a media file in seconds.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let parsed = ffprobe_json(&["-show_format"], path).await?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| DocqaError::ToolFailed("Could not determine audio duration".into()))
}

/// Whether a media file contains at least one audio stream.
pub async fn has_audio_stream(path: &Path) -> Result<bool> {
    let parsed = ffprobe_json(&["-select_streams", "a", "-show_streams"], path).await?;

    Ok(parsed["streams"]
        .as_array()
        .is_some_and(|streams| !streams.is_empty()))
}
