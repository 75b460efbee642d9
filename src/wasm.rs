//! Browser bindings: the mask editor driven from JavaScript.
//!
//! The page draws [`EditorHandle::preview_rgba`] into a canvas and forwards
//! pointer events to the stroke methods. Coordinates are canvas pixels.

use maskpaint_canvas::{BrushMode, MaskEditor};
use wasm_bindgen::prelude::*;

use crate::api::SessionView;
use crate::client::{EditorClient, mask_request};
use crate::params::{InpaintParameters, RawParameters};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("maskpaint editor loaded");
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// One open editing session.
#[wasm_bindgen]
pub struct EditorHandle {
    client: EditorClient,
    session: SessionView,
    editor: MaskEditor,
}

#[wasm_bindgen]
impl EditorHandle {
    /// Fetch the session and its image from the service at `api_base`.
    pub async fn open(api_base: String, session_id: String) -> Result<EditorHandle, JsValue> {
        let client = EditorClient::new(api_base);
        let (session, editor) = client.open_editor(&session_id).await.map_err(to_js)?;
        Ok(Self {
            client,
            session,
            editor,
        })
    }

    #[wasm_bindgen(getter)]
    pub fn session_id(&self) -> String {
        self.session.id.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn image_url(&self) -> String {
        self.session.image_url.clone()
    }

    /// Canvas width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.editor.surface().display_size().width
    }

    /// Canvas height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.editor.surface().display_size().height
    }

    // -------------------------------------------------------------------------
    // Brush
    // -------------------------------------------------------------------------

    /// `"brush"` or `"eraser"`.
    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode: BrushMode = mode.parse().map_err(to_js)?;
        self.editor.set_mode(mode);
        Ok(())
    }

    pub fn mode(&self) -> String {
        self.editor.mode().name().to_string()
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.editor.set_brush_size(size);
    }

    pub fn brush_size(&self) -> f32 {
        self.editor.brush_size()
    }

    // -------------------------------------------------------------------------
    // Strokes
    // -------------------------------------------------------------------------

    pub fn begin_stroke(&mut self, x: f32, y: f32) -> Result<(), JsValue> {
        self.editor.begin_stroke(x, y).map_err(to_js)
    }

    pub fn extend_stroke(&mut self, x: f32, y: f32) {
        self.editor.extend_stroke(x, y);
    }

    /// Returns whether a stroke was committed.
    pub fn end_stroke(&mut self) -> Result<bool, JsValue> {
        self.editor.end_stroke().map_err(to_js)
    }

    /// Whether a stroke is in progress (pointer still down).
    pub fn is_drawing(&self) -> bool {
        self.editor.is_drawing()
    }

    pub fn clear(&mut self) -> Result<(), JsValue> {
        self.editor.clear().map_err(to_js)
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<bool, JsValue> {
        self.editor.undo().map_err(to_js)
    }

    pub fn redo(&mut self) -> Result<bool, JsValue> {
        self.editor.redo().map_err(to_js)
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    /// Canvas-sized RGBA pixels of the image with the painted area overlaid.
    pub fn preview_rgba(&self) -> Result<Vec<u8>, JsValue> {
        Ok(self.editor.render_preview().map_err(to_js)?.into_raw())
    }

    /// Upload the mask. Resolves to the stored mask URL.
    pub fn save(
        &self,
        prompt: String,
        denoise: Option<f64>,
        steps: Option<f64>,
        guidance: Option<f64>,
        scheduler: Option<String>,
    ) -> Result<js_sys::Promise, JsValue> {
        let parameters = InpaintParameters::normalize(Some(&RawParameters {
            denoise,
            steps,
            guidance,
            scheduler,
        }));
        let request =
            mask_request(&self.session.id, &self.editor, prompt, &parameters).map_err(to_js)?;
        let client = self.client.clone();

        Ok(wasm_bindgen_futures::future_to_promise(async move {
            let saved = client.save_mask(&request).await.map_err(to_js)?;
            Ok(JsValue::from_str(&saved.mask_url))
        }))
    }
}
