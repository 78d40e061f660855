//! OpenAI Whisper transcription implementation.

use super::{join_pieces, Transcriber};
use crate::audio::{extract_audio, split_by_size};
use crate::config::Settings;
use crate::error::{DocqaError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
    max_chunk_bytes: u64,
    max_concurrent_chunks: usize,
    temp_dir: PathBuf,
}

impl WhisperTranscriber {
    /// Create a transcriber from application settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = create_client(&settings.llm)?;

        Ok(Self {
            client,
            model: settings.transcription.model.clone(),
            max_chunk_bytes: settings.transcription.max_chunk_bytes,
            max_concurrent_chunks: settings.transcription.max_concurrent_chunks.max(1),
            temp_dir: settings.temp_dir(),
        })
    }

    /// Transcribe a single audio piece (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_piece(&self, audio_path: &Path) -> Result<String> {
        let started = Instant::now();
        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .build()
            .map_err(|e| DocqaError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| DocqaError::OpenAI(format!("Whisper API error: {}", e)))?;

        debug!(
            "Transcribed piece in {:.2}s ({} chars)",
            started.elapsed().as_secs_f64(),
            response.text.len()
        );
        Ok(response.text)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(video_path = %video_path.display()))]
    async fn transcribe(&self, video_path: &Path) -> Result<String> {
        let started = Instant::now();

        std::fs::create_dir_all(&self.temp_dir)?;
        let work_dir = tempfile::Builder::new()
            .prefix("transcribe-")
            .tempdir_in(&self.temp_dir)?;

        let audio_path = work_dir.path().join("audio.mp3");
        if !extract_audio(video_path, &audio_path).await? {
            return Ok(String::new());
        }

        let pieces = split_by_size(&audio_path, &work_dir.path().join("pieces"), self.max_chunk_bytes).await?;
        info!("Transcribing {} audio piece(s) with {}", pieces.len(), self.model);

        let texts = transcribe_in_order(pieces, self.max_concurrent_chunks, |piece| async move {
            self.transcribe_piece(&piece).await
        })
        .await?;

        let transcript = join_pieces(texts);
        info!(
            "Transcription finished in {:.2}s ({} chars)",
            started.elapsed().as_secs_f64(),
            transcript.len()
        );

        Ok(transcript)
    }
}

/// Run `transcribe` over the pieces with at most `concurrency` in flight,
/// returning the texts in piece order.
async fn transcribe_in_order<F, Fut>(
    pieces: Vec<PathBuf>,
    concurrency: usize,
    transcribe: F,
) -> Result<Vec<String>>
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    stream::iter(pieces)
        .map(transcribe)
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pieces_come_back_in_order_when_overlapped() {
        let pieces: Vec<PathBuf> = (0..4).map(|i| PathBuf::from(format!("chunk_{i:03}.mp3"))).collect();

        // Earlier pieces finish last; spawning also requires the future to be Send.
        let texts = tokio::spawn(transcribe_in_order(pieces, 4, |piece| async move {
            let idx: u64 = piece.to_string_lossy()[6..9].parse().unwrap();
            tokio::time::sleep(Duration::from_millis(40 - idx * 10)).await;
            Ok(format!("piece {idx}"))
        }))
        .await
        .unwrap()
        .unwrap();

        assert_eq!(texts, vec!["piece 0", "piece 1", "piece 2", "piece 3"]);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let texts = transcribe_in_order(vec![PathBuf::from("a.mp3")], 0, |_| async {
            Ok("hello".to_string())
        })
        .await
        .unwrap();
        assert_eq!(texts, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_piece_failure_propagates() {
        let result = transcribe_in_order(
            vec![PathBuf::from("a.mp3"), PathBuf::from("b.mp3")],
            1,
            |piece| async move {
                if piece.ends_with("b.mp3") {
                    Err(DocqaError::Transcription("boom".into()))
                } else {
                    Ok("ok".to_string())
                }
            },
        )
        .await;
        assert!(matches!(result, Err(DocqaError::Transcription(_))));
    }
}
