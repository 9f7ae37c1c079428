use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement};

/// The three stacked raster surfaces for one mounted image: the opaque base
/// image, the translucent paint mask, and the ephemeral cursor preview.
/// All three always share the same pixel dimensions and CSS placement.
pub struct CanvasStack {
    pub base: HtmlCanvasElement,
    pub mask: HtmlCanvasElement,
    pub mask_ctx: CanvasRenderingContext2d,
    pub cursor_ctx: CanvasRenderingContext2d,
    pub width: u32,
    pub height: u32,
}

/// Largest size that fits the image inside the container while preserving
/// its aspect ratio: fit to width when the image is relatively wider than
/// the container, otherwise fit to height.
pub fn fitted_size(image_w: f64, image_h: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let image_aspect = image_w / image_h;
    let container_aspect = container_w / container_h;
    if image_aspect > container_aspect {
        (container_w, container_w / image_aspect)
    } else {
        (container_h * image_aspect, container_h)
    }
}

fn make_layer(
    document: &Document,
    class: &str,
    width: u32,
    height: u32,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_class_name(class);
    canvas.set_width(width);
    canvas.set_height(height);
    let style = canvas.style();
    let _ = style.set_property("position", "absolute");
    let _ = style.set_property("left", "50%");
    let _ = style.set_property("top", "50%");
    let _ = style.set_property("transform", "translate(-50%, -50%)");
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((canvas, ctx))
}

/// Replaces whatever canvases live in the editor container with a fresh
/// triple fitted to `image`, and draws the image into the base surface.
/// The previous mask is discarded entirely; switching images never carries
/// paint across. Fails with a configuration error when the container is
/// absent from the document.
pub fn mount_image(
    document: &Document,
    container_id: &str,
    image: &HtmlImageElement,
) -> Result<CanvasStack, JsValue> {
    let container = document.get_element_by_id(container_id).ok_or_else(|| {
        JsValue::from_str(&format!("Missing editor container: {container_id}"))
    })?;

    while let Ok(Some(existing)) = container.query_selector("canvas") {
        existing.remove();
    }

    let rect = container.get_bounding_client_rect();
    let image_w = f64::from(image.natural_width());
    let image_h = f64::from(image.natural_height());
    let (scaled_w, scaled_h) = fitted_size(image_w, image_h, rect.width(), rect.height());
    let width = scaled_w.round() as u32;
    let height = scaled_h.round() as u32;

    let (base, base_ctx) = make_layer(document, "base-canvas", width, height)?;
    let (mask, mask_ctx) = make_layer(document, "drawing-canvas", width, height)?;
    let (cursor, cursor_ctx) = make_layer(document, "cursor-canvas", width, height)?;

    // The cursor layer sits on top but must never swallow pointer input;
    // the mask layer owns all pointer listeners.
    let _ = cursor.style().set_property("pointer-events", "none");
    let _ = mask.style().set_property("touch-action", "none");
    mask_ctx.set_line_cap("round");
    mask_ctx.set_line_join("round");

    container.append_child(&base)?;
    container.append_child(&mask)?;
    container.append_child(&cursor)?;

    base_ctx.draw_image_with_html_image_element_and_dw_and_dh(
        image,
        0.0,
        0.0,
        f64::from(width),
        f64::from(height),
    )?;

    Ok(CanvasStack {
        base,
        mask,
        mask_ctx,
        cursor_ctx,
        width,
        height,
    })
}

impl CanvasStack {
    pub fn clear_mask(&self) {
        self.mask_ctx
            .clear_rect(0.0, 0.0, f64::from(self.width), f64::from(self.height));
    }

    pub fn clear_cursor(&self) {
        self.cursor_ctx
            .clear_rect(0.0, 0.0, f64::from(self.width), f64::from(self.height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_constrained_by_container_width() {
        // 800x600 into 400x300: same aspect, fits exactly.
        assert_eq!(fitted_size(800.0, 600.0, 400.0, 300.0), (400.0, 300.0));
        // Much wider image: width-fit, height derived.
        let (w, h) = fitted_size(1600.0, 400.0, 400.0, 300.0);
        assert_eq!(w, 400.0);
        assert_eq!(h, 100.0);
    }

    #[test]
    fn tall_image_is_constrained_by_container_height() {
        let (w, h) = fitted_size(300.0, 600.0, 400.0, 300.0);
        assert_eq!(h, 300.0);
        assert_eq!(w, 150.0);
    }

    #[test]
    fn fitted_size_preserves_aspect_ratio() {
        let (w, h) = fitted_size(1024.0, 768.0, 500.0, 210.0);
        let original = 1024.0 / 768.0;
        assert!((w / h - original).abs() < 1e-9);
        assert!(w <= 500.0 && h <= 210.0);
    }
}
