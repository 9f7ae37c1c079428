use web_sys::{HtmlCanvasElement, PointerEvent};

/// Maps a client-space (CSS pixel) position into canvas pixel space.
///
/// The canvas is usually displayed at a different size than its backing
/// resolution, so DOM pointer coordinates must be rescaled by
/// `pixel / css` per axis. No clamping: positions outside the box map to
/// negative or over-range coordinates and callers decide what to do.
pub fn scale_point(
    client_x: f64,
    client_y: f64,
    box_left: f64,
    box_top: f64,
    css_width: f64,
    css_height: f64,
    pixel_width: f64,
    pixel_height: f64,
) -> (f64, f64) {
    let scale_x = pixel_width / css_width;
    let scale_y = pixel_height / css_height;
    ((client_x - box_left) * scale_x, (client_y - box_top) * scale_y)
}

/// Converts a pointer event to canvas pixel coordinates. Reads the bounding
/// rect fresh on every call; the rect moves whenever the window resizes, so
/// it must never be cached.
pub fn pointer_to_canvas(event: &PointerEvent, canvas: &HtmlCanvasElement) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    scale_point(
        f64::from(event.client_x()),
        f64::from(event.client_y()),
        rect.left(),
        rect.top(),
        rect.width(),
        rect.height(),
        f64::from(canvas.width()),
        f64::from(canvas.height()),
    )
}

/// Inverse mapping, used to pin peer drawing bubbles next to the last
/// replicated stroke position.
pub fn canvas_to_client(canvas: &HtmlCanvasElement, x: f64, y: f64) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    let scale_x = f64::from(canvas.width()) / rect.width();
    let scale_y = f64::from(canvas.height()) / rect.height();
    (rect.left() + x / scale_x, rect.top() + y / scale_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_box_samples_stay_within_pixel_bounds() {
        // 800x600 canvas displayed at 400x300, box at (50, 20).
        let corners = [
            (50.0, 20.0, 0.0, 0.0),
            (450.0, 20.0, 800.0, 0.0),
            (50.0, 320.0, 0.0, 600.0),
            (450.0, 320.0, 800.0, 600.0),
        ];
        for (cx, cy, px, py) in corners {
            let (x, y) = scale_point(cx, cy, 50.0, 20.0, 400.0, 300.0, 800.0, 600.0);
            assert_eq!((x, y), (px, py));
        }
        let (x, y) = scale_point(250.0, 170.0, 50.0, 20.0, 400.0, 300.0, 800.0, 600.0);
        assert!(x >= 0.0 && x <= 800.0);
        assert!(y >= 0.0 && y <= 600.0);
    }

    #[test]
    fn out_of_box_samples_are_not_clamped() {
        let (x, y) = scale_point(40.0, 10.0, 50.0, 20.0, 400.0, 300.0, 800.0, 600.0);
        assert_eq!(x, -20.0);
        assert_eq!(y, -20.0);

        let (x, y) = scale_point(460.0, 330.0, 50.0, 20.0, 400.0, 300.0, 800.0, 600.0);
        assert!(x > 800.0);
        assert!(y > 600.0);
    }
}
