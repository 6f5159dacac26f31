//! # Overlay Module
//!
//! Questo modulo gestisce gli overlay liberi (testo e sticker) compositi
//! sopra il media durante l'editing di una story.
//!
//! ## Protocollo di selezione:
//! - Esattamente un overlay selezionato alla volta; selezionarne uno nuovo
//!   deseleziona il precedente; tap sullo sfondo deseleziona tutti
//! - Solo l'overlay selezionato espone scale slider, colore e delete
//!
//! ## Protocollo di drag (pointer-capture):
//! - Press cattura il puntatore con l'offset di presa
//! - I movimenti aggiornano `x,y` in pixel assoluti dentro il canvas di edit
//! - Release termina il drag
//!
//! Gli overlay vivono solo nella sessione di editing: vengono scartati alla
//! pubblicazione o all'annullamento, mai persistiti.

use serde::Serialize;

/// Scale slider bounds
pub const MIN_OVERLAY_SCALE: f64 = 0.5;
pub const MAX_OVERLAY_SCALE: f64 = 3.0;

/// Kind of user-placed overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum OverlayKind {
    Text { color: String },
    Sticker,
}

/// A text or sticker element composited over the media
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    /// Creation-order unique id within the session
    pub id: u64,
    #[serde(flatten)]
    pub kind: OverlayKind,
    /// Text content or emoji
    pub content: String,
    /// Absolute pixel position within the edit canvas
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Overlay {
    pub fn is_text(&self) -> bool {
        matches!(self.kind, OverlayKind::Text { .. })
    }
}

/// Object-fit of the media element within the edit frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Fills the frame, crops overflow
    #[default]
    Cover,
    /// Letterboxed, full frame visible with blurred-backdrop fill
    Contain,
}

impl FitMode {
    pub fn toggled(self) -> Self {
        match self {
            FitMode::Cover => FitMode::Contain,
            FitMode::Contain => FitMode::Cover,
        }
    }
}

/// In-flight pointer-capture drag of one overlay
struct OverlayDrag {
    id: u64,
    grab_dx: f64,
    grab_dy: f64,
}

/// Session-owned set of overlays with exclusive selection
#[derive(Default)]
pub struct OverlaySet {
    overlays: Vec<Overlay>,
    selected: Option<u64>,
    next_id: u64,
    drag: Option<OverlayDrag>,
}

impl OverlaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Overlay> {
        let id = self.selected?;
        self.overlays.iter().find(|o| o.id == id)
    }

    fn add(&mut self, kind: OverlayKind, content: String, x: f64, y: f64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.overlays.push(Overlay {
            id,
            kind,
            content,
            x,
            y,
            scale: 1.0,
        });
        // A freshly placed overlay becomes the selection
        self.selected = Some(id);
        id
    }

    /// Place a text overlay; newly added overlays start selected
    pub fn add_text(&mut self, content: impl Into<String>, color: impl Into<String>, x: f64, y: f64) -> u64 {
        self.add(OverlayKind::Text { color: color.into() }, content.into(), x, y)
    }

    /// Place a sticker (emoji) overlay
    pub fn add_sticker(&mut self, emoji: impl Into<String>, x: f64, y: f64) -> u64 {
        self.add(OverlayKind::Sticker, emoji.into(), x, y)
    }

    /// Select an overlay, deselecting the previous one
    pub fn select(&mut self, id: u64) -> bool {
        if self.overlays.iter().any(|o| o.id == id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    /// Tap on the background: clear the selection
    pub fn deselect_all(&mut self) {
        self.selected = None;
    }

    /// Delete action, available only on the selected overlay
    pub fn remove_selected(&mut self) -> Option<Overlay> {
        let id = self.selected.take()?;
        let idx = self.overlays.iter().position(|o| o.id == id)?;
        Some(self.overlays.remove(idx))
    }

    /// Scale slider, available only on the selected overlay; clamped
    pub fn set_selected_scale(&mut self, scale: f64) {
        if let Some(id) = self.selected {
            if let Some(overlay) = self.overlays.iter_mut().find(|o| o.id == id) {
                overlay.scale = scale.clamp(MIN_OVERLAY_SCALE, MAX_OVERLAY_SCALE);
            }
        }
    }

    /// Color picker, text overlays only
    pub fn set_selected_color(&mut self, color: impl Into<String>) {
        if let Some(id) = self.selected {
            if let Some(overlay) = self.overlays.iter_mut().find(|o| o.id == id) {
                if let OverlayKind::Text { color: c } = &mut overlay.kind {
                    *c = color.into();
                }
            }
        }
    }

    /// Pointer press on an overlay: capture it (and select it) for dragging
    pub fn begin_drag(&mut self, id: u64, pointer_x: f64, pointer_y: f64) -> bool {
        let Some(overlay) = self.overlays.iter().find(|o| o.id == id) else {
            return false;
        };
        self.drag = Some(OverlayDrag {
            id,
            grab_dx: pointer_x - overlay.x,
            grab_dy: pointer_y - overlay.y,
        });
        self.selected = Some(id);
        true
    }

    /// Pointer move while captured: update the overlay position
    pub fn drag_to(&mut self, pointer_x: f64, pointer_y: f64) {
        let Some(drag) = &self.drag else {
            return;
        };
        let (id, dx, dy) = (drag.id, drag.grab_dx, drag.grab_dy);
        if let Some(overlay) = self.overlays.iter_mut().find(|o| o.id == id) {
            overlay.x = pointer_x - dx;
            overlay.y = pointer_y - dy;
        }
    }

    /// Pointer release: end the capture
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_creation_order() {
        let mut set = OverlaySet::new();
        let a = set.add_text("hello", "#fff", 10.0, 10.0);
        let b = set.add_sticker("🔥", 50.0, 60.0);
        assert!(b > a);
        assert_eq!(set.overlays().len(), 2);
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut set = OverlaySet::new();
        let a = set.add_text("a", "#fff", 0.0, 0.0);
        let b = set.add_sticker("⭐", 0.0, 0.0);

        // Last added is selected
        assert_eq!(set.selected_id(), Some(b));

        set.select(a);
        assert_eq!(set.selected_id(), Some(a));

        set.deselect_all();
        assert_eq!(set.selected_id(), None);

        assert!(!set.select(999));
    }

    #[test]
    fn test_scale_clamped_to_slider_bounds() {
        let mut set = OverlaySet::new();
        set.add_text("t", "#000", 0.0, 0.0);

        set.set_selected_scale(10.0);
        assert_eq!(set.selected().unwrap().scale, MAX_OVERLAY_SCALE);

        set.set_selected_scale(0.1);
        assert_eq!(set.selected().unwrap().scale, MIN_OVERLAY_SCALE);
    }

    #[test]
    fn test_scale_ignored_without_selection() {
        let mut set = OverlaySet::new();
        let id = set.add_text("t", "#000", 0.0, 0.0);
        set.deselect_all();
        set.set_selected_scale(2.0);
        set.select(id);
        assert_eq!(set.selected().unwrap().scale, 1.0);
    }

    #[test]
    fn test_color_only_affects_text() {
        let mut set = OverlaySet::new();
        let sticker = set.add_sticker("🎈", 0.0, 0.0);
        set.select(sticker);
        set.set_selected_color("#f00");
        assert_eq!(set.selected().unwrap().kind, OverlayKind::Sticker);

        let text = set.add_text("t", "#fff", 0.0, 0.0);
        set.select(text);
        set.set_selected_color("#f00");
        assert_eq!(
            set.selected().unwrap().kind,
            OverlayKind::Text { color: "#f00".to_string() }
        );
    }

    #[test]
    fn test_drag_preserves_grab_offset() {
        let mut set = OverlaySet::new();
        let id = set.add_text("t", "#fff", 100.0, 100.0);

        // Press 8px right and 4px below the overlay origin
        assert!(set.begin_drag(id, 108.0, 104.0));
        set.drag_to(158.0, 124.0);
        let overlay = set.selected().unwrap();
        assert_eq!((overlay.x, overlay.y), (150.0, 120.0));

        set.end_drag();
        assert!(!set.is_dragging());

        // Moves after release are ignored
        set.drag_to(0.0, 0.0);
        assert_eq!(set.selected().unwrap().x, 150.0);
    }

    #[test]
    fn test_remove_selected() {
        let mut set = OverlaySet::new();
        let a = set.add_text("a", "#fff", 0.0, 0.0);
        set.add_sticker("🌊", 0.0, 0.0);
        set.select(a);

        let removed = set.remove_selected().unwrap();
        assert_eq!(removed.id, a);
        assert_eq!(set.overlays().len(), 1);
        assert_eq!(set.selected_id(), None);

        // Nothing selected, nothing removed
        assert!(set.remove_selected().is_none());
    }

    #[test]
    fn test_fit_toggle() {
        assert_eq!(FitMode::Cover.toggled(), FitMode::Contain);
        assert_eq!(FitMode::Contain.toggled(), FitMode::Cover);
    }

    #[test]
    fn test_overlay_wire_shape() {
        let mut set = OverlaySet::new();
        set.add_text("hi", "#fff", 1.0, 2.0);
        let json = serde_json::to_value(&set.overlays()[0]).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["color"], "#fff");
        assert_eq!(json["content"], "hi");
    }
}
