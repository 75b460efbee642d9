//! The mask editor: surface, brush, active stroke and snapshot history.

use image::RgbaImage;

use crate::error::CanvasResult;
use crate::history::History;
use crate::mask::Mask;
use crate::preview::render_preview;
use crate::stroke::{clamp_brush_size, Brush, BrushMode, CanvasState, Point, StrokeBuilder};
use crate::surface::{Size, Surface};

/// Interactive mask editor for one source image.
///
/// Every completed stroke records a serialized [`CanvasState`] in the
/// history, starting with the empty canvas, so undo and redo simply restore
/// the snapshot at the new history index.
#[derive(Debug, Clone)]
pub struct MaskEditor {
    surface: Surface,
    brush: Brush,
    state: CanvasState,
    active: Option<StrokeBuilder>,
    history: History<String>,
}

impl MaskEditor {
    /// Load `image_bytes` onto a canvas of `display` size.
    pub fn open(image_bytes: &[u8], display: Option<Size>) -> CanvasResult<Self> {
        let surface = Surface::load(image_bytes, display)?;
        Self::with_surface(surface)
    }

    /// Start editing on an already built surface.
    pub fn with_surface(surface: Surface) -> CanvasResult<Self> {
        let mut editor = Self {
            surface,
            brush: Brush::default(),
            state: CanvasState::default(),
            active: None,
            history: History::default(),
        };
        editor.snapshot()?;
        log::info!(
            "🖌️ Editor ready: {}x{} canvas",
            editor.surface.display_size().width,
            editor.surface.display_size().height
        );
        Ok(editor)
    }

    // -------------------------------------------------------------------------
    // Brush
    // -------------------------------------------------------------------------

    pub fn mode(&self) -> BrushMode {
        self.brush.mode
    }

    pub fn set_mode(&mut self, mode: BrushMode) {
        log::debug!("Brush mode: {}", mode.name());
        self.brush.mode = mode;
    }

    pub fn brush_size(&self) -> f32 {
        self.brush.size
    }

    /// Set the brush diameter (clamped). Affects strokes started afterwards.
    pub fn set_brush_size(&mut self, size: f32) {
        self.brush.size = clamp_brush_size(size);
    }

    // -------------------------------------------------------------------------
    // Strokes
    // -------------------------------------------------------------------------

    /// Pointer down. An unfinished stroke is committed first.
    pub fn begin_stroke(&mut self, x: f32, y: f32) -> CanvasResult<()> {
        if self.active.is_some() {
            self.end_stroke()?;
        }
        self.active = Some(StrokeBuilder::begin(self.brush, Point::new(x, y)));
        Ok(())
    }

    /// Pointer move while drawing. Ignored when no stroke is active.
    pub fn extend_stroke(&mut self, x: f32, y: f32) {
        if let Some(builder) = self.active.as_mut() {
            builder.extend(Point::new(x, y));
        }
    }

    /// Pointer up: commit the stroke and record a snapshot.
    ///
    /// Returns false when there was no active stroke.
    pub fn end_stroke(&mut self) -> CanvasResult<bool> {
        let Some(builder) = self.active.take() else {
            return Ok(false);
        };
        let stroke = builder.finish();
        log::trace!(
            "Stroke committed: {} points, {} mode",
            stroke.points.len(),
            stroke.mode.name()
        );
        self.state.strokes.push(stroke);
        self.snapshot()?;
        Ok(true)
    }

    /// Whether a stroke is in progress
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Remove every stroke as one undoable step.
    pub fn clear(&mut self) -> CanvasResult<()> {
        self.active = None;
        if self.state.strokes.is_empty() {
            return Ok(());
        }
        self.state.strokes.clear();
        self.snapshot()
    }

    /// Replace the drawing with `state` as one undoable step.
    pub fn load_state(&mut self, state: CanvasState) -> CanvasResult<()> {
        self.active = None;
        self.state = state;
        self.snapshot()
    }

    /// Strokes currently on the canvas
    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous snapshot. Returns false if nothing changed.
    pub fn undo(&mut self) -> CanvasResult<bool> {
        self.active = None;
        let Some(json) = self.history.undo() else {
            return Ok(false);
        };
        self.state = CanvasState::from_json(json)?;
        Ok(true)
    }

    /// Restore the next snapshot. Returns false if nothing changed.
    pub fn redo(&mut self) -> CanvasResult<bool> {
        self.active = None;
        let Some(json) = self.history.redo() else {
            return Ok(false);
        };
        self.state = CanvasState::from_json(json)?;
        Ok(true)
    }

    /// Read-only access to the snapshot history
    pub fn history(&self) -> &History<String> {
        &self.history
    }

    fn snapshot(&mut self) -> CanvasResult<()> {
        self.history.record(self.state.to_json()?);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Rasterize the current strokes at the original image size.
    pub fn mask(&self) -> CanvasResult<Mask> {
        Mask::rasterize(&self.state, &self.surface)
    }

    /// Current mask as PNG bytes.
    pub fn export_mask_png(&self) -> CanvasResult<Vec<u8>> {
        self.mask()?.to_png()
    }

    /// Current mask as a PNG data URL, the form the save endpoint accepts.
    pub fn export_mask_data_url(&self) -> CanvasResult<String> {
        if !self.state.has_paint() {
            log::warn!("Exporting a mask with nothing painted");
        }
        let mask = self.mask()?;
        log::info!(
            "Exporting mask {}x{} ({:.1}% covered)",
            mask.width(),
            mask.height(),
            mask.coverage() * 100.0
        );
        mask.to_data_url()
    }

    /// Display-sized composite of the image and the painted area.
    pub fn render_preview(&self) -> CanvasResult<RgbaImage> {
        Ok(render_preview(&self.surface, &self.mask()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_BRUSH_SIZE, HISTORY_LIMIT, MAX_BRUSH_SIZE};
    use image::DynamicImage;

    fn editor() -> MaskEditor {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(100, 100));
        MaskEditor::with_surface(Surface::from_image(image, None).unwrap()).unwrap()
    }

    fn draw(editor: &mut MaskEditor, from: (f32, f32), to: (f32, f32)) {
        editor.begin_stroke(from.0, from.1).unwrap();
        editor.extend_stroke(to.0, to.1);
        assert!(editor.end_stroke().unwrap());
    }

    #[test]
    fn test_opens_with_initial_snapshot() {
        let editor = editor();
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.can_undo());
        assert!(!editor.can_redo());
        assert_eq!(editor.mode(), BrushMode::Paint);
        assert_eq!(editor.brush_size(), DEFAULT_BRUSH_SIZE);
    }

    #[test]
    fn test_stroke_records_history_and_undo_restores() {
        let mut editor = editor();
        draw(&mut editor, (10.0, 10.0), (90.0, 10.0));
        draw(&mut editor, (10.0, 50.0), (90.0, 50.0));
        assert_eq!(editor.state().strokes.len(), 2);

        assert!(editor.undo().unwrap());
        assert_eq!(editor.state().strokes.len(), 1);
        assert!(editor.undo().unwrap());
        assert!(editor.state().strokes.is_empty());
        assert!(!editor.undo().unwrap());

        assert!(editor.redo().unwrap());
        assert_eq!(editor.state().strokes.len(), 1);
    }

    #[test]
    fn test_new_stroke_after_undo_discards_redo() {
        let mut editor = editor();
        draw(&mut editor, (10.0, 10.0), (20.0, 10.0));
        draw(&mut editor, (10.0, 20.0), (20.0, 20.0));
        editor.undo().unwrap();
        draw(&mut editor, (50.0, 50.0), (60.0, 60.0));

        assert!(!editor.can_redo());
        assert_eq!(editor.state().strokes.len(), 2);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut editor = editor();
        for i in 0..(HISTORY_LIMIT + 10) {
            let y = (i % 100) as f32;
            draw(&mut editor, (0.0, y), (10.0, y));
        }
        assert_eq!(editor.history().len(), HISTORY_LIMIT);
        assert!(!editor.can_redo());
    }

    #[test]
    fn test_is_drawing_tracks_active_stroke() {
        let mut editor = editor();
        assert!(!editor.is_drawing());
        editor.begin_stroke(1.0, 1.0).unwrap();
        assert!(editor.is_drawing());
        editor.end_stroke().unwrap();
        assert!(!editor.is_drawing());
    }

    #[test]
    fn test_end_without_begin_is_noop() {
        let mut editor = editor();
        editor.extend_stroke(5.0, 5.0);
        assert!(!editor.end_stroke().unwrap());
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_eraser_and_brush_size_apply_to_new_strokes() {
        let mut editor = editor();
        editor.set_brush_size(1000.0);
        assert_eq!(editor.brush_size(), MAX_BRUSH_SIZE);
        editor.set_brush_size(30.0);
        draw(&mut editor, (0.0, 50.0), (100.0, 50.0));

        editor.set_mode(BrushMode::Erase);
        draw(&mut editor, (50.0, 0.0), (50.0, 100.0));

        let strokes = &editor.state().strokes;
        assert_eq!(strokes[0].mode, BrushMode::Paint);
        assert_eq!(strokes[0].width, 30.0);
        assert_eq!(strokes[1].mode, BrushMode::Erase);

        let mask = editor.mask().unwrap();
        assert!(mask.is_masked(10, 50));
        assert!(!mask.is_masked(50, 50));
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut editor = editor();
        draw(&mut editor, (10.0, 10.0), (20.0, 20.0));
        editor.clear().unwrap();
        assert!(editor.state().strokes.is_empty());
        editor.undo().unwrap();
        assert_eq!(editor.state().strokes.len(), 1);
    }

    #[test]
    fn test_export_data_url() {
        let mut editor = editor();
        draw(&mut editor, (10.0, 10.0), (20.0, 20.0));
        let url = editor.export_mask_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(editor.render_preview().unwrap().dimensions(), (100, 100));
    }
}
