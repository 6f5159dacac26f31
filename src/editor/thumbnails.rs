//! # Thumbnail Extraction Module
//!
//! Questo modulo estrae frame a bassa risoluzione da un video caricato
//! nell'editor: uno per le swatch di preview filtro e cinque per la strip di
//! scrubbing della timeline.
//!
//! ## Responsabilità:
//! - Analisi durata video con ffprobe
//! - Cattura singolo frame a un timestamp con ffmpeg (file temporaneo)
//! - Downscale del frame con `image` a larghezza thumbnail
//! - Ogni cattura è limitata da un timeout: un seek bloccato non può
//!   appendere l'editor a tempo indefinito
//!
//! ## Piano di campionamento:
//! 1. Primo frame a `min(0.5s, durata/2)` per evitare il frame nero vicino a t=0
//! 2. Poi 5 punti equispaziati su `[primo, durata]` per la strip
//!
//! ## Ciclo di vita:
//! Estrazione una sola volta per video caricato (via `ThumbnailCache`); i
//! frame vivono solo nella sessione di editing e non vengono persistiti.
//!
//! ## Dipendenze richieste:
//! - `ffmpeg`: Cattura frame
//! - `ffprobe`: Analisi durata

use crate::args;
use crate::error::PublishError;
use crate::platform::PlatformCommands;
use anyhow::Result;
use image::DynamicImage;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::debug;

/// Number of frames sampled for the scrub strip
pub const STRIP_SAMPLES: usize = 5;

/// Target width of extracted thumbnails in pixels
pub const THUMBNAIL_WIDTH: u32 = 160;

/// Bounded wait for a single frame capture
pub const FRAME_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// A low-resolution frame captured at a point in the video
pub struct Thumbnail {
    pub time: f64,
    pub image: DynamicImage,
}

/// All frames extracted for one editing session
pub struct ThumbnailSet {
    /// Frame backing the filter-preview swatches
    pub filter_preview: Thumbnail,
    /// Evenly spaced frames for the scrub strip
    pub strip: Vec<Thumbnail>,
}

/// Sampling plan: the filter-preview point plus the strip points.
///
/// The preview frame is taken at `min(0.5, duration/2)` to dodge the black
/// frame most encoders put near t=0; the strip spans `[preview, duration]`.
pub fn sample_times(duration: f64) -> (f64, Vec<f64>) {
    let duration = duration.max(0.0);
    let preview = (0.5_f64).min(duration / 2.0);

    let span = duration - preview;
    let strip = (0..STRIP_SAMPLES)
        .map(|i| preview + span * (i as f64) / ((STRIP_SAMPLES - 1) as f64))
        .collect();

    (preview, strip)
}

/// Frame extraction backed by ffmpeg/ffprobe
pub struct FrameGrabber;

impl FrameGrabber {
    /// Check if required tools are available
    pub async fn check_dependencies() -> Result<()> {
        let platform = PlatformCommands::instance();
        let tools = ["ffmpeg", "ffprobe"];

        for tool in &tools {
            if !platform.is_command_available(tool).await {
                return Err(PublishError::MissingDependency(format!(
                    "{} is required for video thumbnails",
                    tool
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Read the duration of a video in seconds using ffprobe
    pub async fn probe_duration(video_path: &Path) -> Result<f64, PublishError> {
        let platform = PlatformCommands::instance();
        let ffprobe_cmd = platform.get_command("ffprobe");

        let mut cmd = tokio::process::Command::new(ffprobe_cmd);
        cmd.args(args![
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            video_path.display(),
        ]);

        let output = cmd
            .output()
            .await
            .map_err(|e| PublishError::Probe(format!("Failed to execute {}: {}", ffprobe_cmd, e)))?;

        if !output.status.success() {
            return Err(PublishError::Probe(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let duration = info["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        if duration <= 0.0 {
            return Err(PublishError::Probe(format!(
                "Could not determine duration of {}",
                video_path.display()
            )));
        }

        Ok(duration)
    }

    /// Capture one low-resolution frame at the given timestamp.
    ///
    /// The whole capture is bounded by [`FRAME_CAPTURE_TIMEOUT`] so a
    /// stalled seek degrades into an error instead of hanging the editor.
    pub async fn grab_frame(video_path: &Path, time: f64) -> Result<Thumbnail, PublishError> {
        tokio::time::timeout(FRAME_CAPTURE_TIMEOUT, Self::grab_frame_inner(video_path, time))
            .await
            .map_err(|_| {
                PublishError::Probe(format!(
                    "Frame capture at {:.2}s timed out for {}",
                    time,
                    video_path.display()
                ))
            })?
    }

    async fn grab_frame_inner(video_path: &Path, time: f64) -> Result<Thumbnail, PublishError> {
        let platform = PlatformCommands::instance();
        let ffmpeg_cmd = platform.get_command("ffmpeg");

        let temp_file = NamedTempFile::with_suffix(".jpg")?;
        let temp_path = temp_file.path().to_path_buf();

        let mut cmd = tokio::process::Command::new(ffmpeg_cmd);
        cmd.args(args![
            "-loglevel",
            "error",
            "-ss",
            time,
            "-i",
            video_path.display(),
            "-frames:v",
            1,
            "-q:v",
            5,
            "-y",
            temp_path.display(),
        ]);

        debug!("Capturing frame at {:.2}s from {}", time, video_path.display());
        let output = cmd
            .output()
            .await
            .map_err(|e| PublishError::Probe(format!("Failed to execute {}: {}", ffmpeg_cmd, e)))?;

        if !output.status.success() {
            return Err(PublishError::Probe(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let full = image::open(&temp_path)?;
        let image = full.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_WIDTH * 2);

        // The NamedTempFile removes the full-size frame when it goes out of scope
        Ok(Thumbnail { time, image })
    }

    /// Run the full sampling plan for a video
    pub async fn extract(video_path: &Path) -> Result<ThumbnailSet, PublishError> {
        let duration = Self::probe_duration(video_path).await?;
        let (preview_time, strip_times) = sample_times(duration);

        let filter_preview = Self::grab_frame(video_path, preview_time).await?;

        let mut strip = Vec::with_capacity(strip_times.len());
        for t in strip_times {
            strip.push(Self::grab_frame(video_path, t).await?);
        }

        Ok(ThumbnailSet {
            filter_preview,
            strip,
        })
    }
}

/// Once-per-video extraction guard.
///
/// Re-renders of the editor call `ensure` freely; extraction only runs when
/// no thumbnails exist yet.
#[derive(Default)]
pub struct ThumbnailCache {
    set: Option<ThumbnailSet>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&ThumbnailSet> {
        self.set.as_ref()
    }

    /// Populate the cache with the provided extraction, unless already done
    pub async fn ensure_with<F, Fut>(&mut self, extract: F) -> Result<&ThumbnailSet, PublishError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<ThumbnailSet, PublishError>>,
    {
        if self.set.is_none() {
            self.set = Some(extract().await?);
        }
        Ok(self.set.as_ref().unwrap())
    }

    /// Populate from the real grabber
    pub async fn ensure(&mut self, video_path: &Path) -> Result<&ThumbnailSet, PublishError> {
        if self.set.is_none() {
            self.set = Some(FrameGrabber::extract(video_path).await?);
        }
        Ok(self.set.as_ref().unwrap())
    }

    /// Discard frames at the end of the editing session
    pub fn clear(&mut self) {
        self.set = None;
    }
}
