//! # Story Media Editor Module
//!
//! Sottosistema indipendente che gestisce la sessione di editing di una
//! story: trim del video, filtri cosmetici, overlay trascinabili e
//! thumbnail della timeline. L'output composto viene passato
//! all'orchestratore di pubblicazione delle story.
//!
//! ## Sotto-moduli:
//! - `trim`: Range di trim e protocollo di drag delle maniglie
//! - `overlay`: Overlay testo/sticker con selezione esclusiva
//! - `thumbnails`: Estrazione frame per strip di scrubbing e preview filtri

pub mod overlay;
pub mod thumbnails;
pub mod trim;

pub use overlay::{FitMode, Overlay, OverlayKind, OverlaySet};
pub use thumbnails::{FrameGrabber, Thumbnail, ThumbnailCache, ThumbnailSet};
pub use trim::{TrimHandle, TrimRange, TrimSession};

use crate::api::StoryPayload;
use std::path::PathBuf;

/// Cosmetic filter presets applied to the media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    None,
    Mono,
    Sepia,
    Warm,
    Cool,
    Vivid,
}

impl Filter {
    pub const ALL: [Filter; 6] = [
        Filter::None,
        Filter::Mono,
        Filter::Sepia,
        Filter::Warm,
        Filter::Cool,
        Filter::Vivid,
    ];

    /// CSS filter string sent along with the story
    pub fn css(&self) -> Option<&'static str> {
        match self {
            Filter::None => None,
            Filter::Mono => Some("grayscale(1)"),
            Filter::Sepia => Some("sepia(0.8)"),
            Filter::Warm => Some("saturate(1.3) hue-rotate(-10deg)"),
            Filter::Cool => Some("saturate(1.1) hue-rotate(15deg)"),
            Filter::Vivid => Some("saturate(1.6) contrast(1.1)"),
        }
    }

    pub fn from_name(name: &str) -> Option<Filter> {
        match name.to_lowercase().as_str() {
            "none" => Some(Filter::None),
            "mono" => Some(Filter::Mono),
            "sepia" => Some(Filter::Sepia),
            "warm" => Some(Filter::Warm),
            "cool" => Some(Filter::Cool),
            "vivid" => Some(Filter::Vivid),
            _ => None,
        }
    }
}

/// One story-editing session: picked media, trim state, filter, overlays.
///
/// Discarded wholesale on publish or cancel; nothing here is persisted.
pub struct EditorSession {
    text: Option<String>,
    media_file: Option<PathBuf>,
    trim: Option<TrimSession>,
    pub overlays: OverlaySet,
    filter: Filter,
    fit: FitMode,
    media_scale: f64,
    pub thumbnails: ThumbnailCache,
}

impl EditorSession {
    /// Text-only story
    pub fn for_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            media_file: None,
            trim: None,
            overlays: OverlaySet::new(),
            filter: Filter::None,
            fit: FitMode::default(),
            media_scale: 1.0,
            thumbnails: ThumbnailCache::new(),
        }
    }

    /// Media story (image or video)
    pub fn for_media(path: PathBuf) -> Self {
        Self {
            text: None,
            media_file: Some(path),
            trim: None,
            overlays: OverlaySet::new(),
            filter: Filter::None,
            fit: FitMode::default(),
            media_scale: 1.0,
            thumbnails: ThumbnailCache::new(),
        }
    }

    pub fn media_file(&self) -> Option<&PathBuf> {
        self.media_file.as_ref()
    }

    /// Called once the video metadata is loaded and the duration is known;
    /// initializes the trim range to the whole clip.
    pub fn media_loaded(&mut self, duration: f64) {
        if self.trim.is_none() {
            self.trim = Some(TrimSession::new(duration));
        }
    }

    pub fn trim(&mut self) -> Option<&mut TrimSession> {
        self.trim.as_mut()
    }

    pub fn trim_range(&self) -> Option<&TrimRange> {
        self.trim.as_ref().map(|t| t.range())
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn fit(&self) -> FitMode {
        self.fit
    }

    pub fn media_scale(&self) -> f64 {
        self.media_scale
    }

    pub fn set_media_scale(&mut self, scale: f64) {
        self.media_scale = scale.clamp(0.5, 3.0);
    }

    /// Toggle cover/contain; the manual scale resets to 1 so fit mode and
    /// zoom never compound unpredictably.
    pub fn toggle_fit(&mut self) {
        self.fit = self.fit.toggled();
        self.media_scale = 1.0;
    }

    /// Hand the composed description to the story publish orchestrator.
    /// Consumes the session: overlays and thumbnails are discarded with it.
    pub fn into_story_payload(self) -> StoryPayload {
        StoryPayload {
            text: self.text,
            media_file: self.media_file,
            filter: self.filter.css().map(String::from),
            trim: self.trim.map(|t| t.range().clone()),
            overlays: self.overlays.overlays().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_toggle_resets_scale() {
        let mut session = EditorSession::for_media(PathBuf::from("clip.mp4"));
        session.set_media_scale(2.4);
        assert_eq!(session.media_scale(), 2.4);

        session.toggle_fit();
        assert_eq!(session.fit(), FitMode::Contain);
        assert_eq!(session.media_scale(), 1.0);

        session.toggle_fit();
        assert_eq!(session.fit(), FitMode::Cover);
    }

    #[test]
    fn test_media_loaded_initializes_trim_once() {
        let mut session = EditorSession::for_media(PathBuf::from("clip.mp4"));
        assert!(session.trim_range().is_none());

        session.media_loaded(14.0);
        assert_eq!(session.trim_range().unwrap().end, 14.0);

        // A spurious re-load never resets the range
        session.media_loaded(99.0);
        assert_eq!(session.trim_range().unwrap().end, 14.0);
    }

    #[test]
    fn test_filter_names_roundtrip() {
        for filter in Filter::ALL {
            if let Some(_css) = filter.css() {
                assert!(filter.css().is_some());
            }
        }
        assert_eq!(Filter::from_name("SEPIA"), Some(Filter::Sepia));
        assert_eq!(Filter::from_name("glitch"), None);
        assert!(Filter::None.css().is_none());
    }

    #[test]
    fn test_payload_composition() {
        let mut session = EditorSession::for_media(PathBuf::from("clip.mp4"));
        session.media_loaded(10.0);
        session.set_filter(Filter::Vivid);
        session.overlays.add_text("sale!", "#ff0", 12.0, 40.0);
        session.overlays.add_sticker("🔥", 80.0, 90.0);

        let payload = session.into_story_payload();
        assert_eq!(payload.media_file, Some(PathBuf::from("clip.mp4")));
        assert_eq!(payload.filter.as_deref(), Some("saturate(1.6) contrast(1.1)"));
        assert_eq!(payload.overlays.len(), 2);
        assert_eq!(payload.trim.unwrap().end, 10.0);
        assert!(payload.text.is_none());
    }

    #[test]
    fn test_text_story_payload() {
        let payload = EditorSession::for_text("hello souk").into_story_payload();
        assert_eq!(payload.text.as_deref(), Some("hello souk"));
        assert!(payload.media_file.is_none());
        assert!(payload.trim.is_none());
    }
}
