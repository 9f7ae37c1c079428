use web_sys::CanvasRenderingContext2d;

use muralboard_shared::{ImageSource, Tool};

/// Slider steps (1-10) are converted to raw pixel units by this factor.
pub const BRUSH_SIZE_FACTOR: f64 = 10.0;

/// Paint strokes always land at 10% opacity, however many times the same
/// pixels are brushed over. Overlap never darkens because each pass first
/// clears the path it is about to stroke.
pub const FIXED_BRUSH_ALPHA: f64 = 0.1;

/// Ratio between a loaded image's native size and the canvas it was fitted
/// into: the axis the fit was constrained by determines the scale.
pub fn fit_scale(image_w: f64, image_h: f64, canvas_w: f64, canvas_h: f64) -> f64 {
    let image_aspect = image_w / image_h;
    let canvas_aspect = canvas_w / canvas_h;
    if image_aspect > canvas_aspect {
        canvas_w / image_w
    } else {
        canvas_h / image_h
    }
}

/// Effective stroke width in canvas pixels for a 1-10 brush size.
///
/// base width (size x 10) x fit scale x source multiplier. Modal gallery
/// images get 3x, Street View captures 2x; the 3:2 ratio compensates for
/// Street View's higher native capture resolution.
pub fn effective_brush_width(
    brush_size: u8,
    image_w: f64,
    image_h: f64,
    canvas_w: f64,
    canvas_h: f64,
    source: ImageSource,
) -> f64 {
    let base = f64::from(brush_size) * BRUSH_SIZE_FACTOR;
    base * fit_scale(image_w, image_h, canvas_w, canvas_h) * source.brush_multiplier()
}

/// Parses `#RRGGBB`. Anything malformed falls back to red, matching the
/// default peer color.
pub fn parse_hex_color(color: &str) -> (u8, u8, u8) {
    let hex = color.strip_prefix('#').unwrap_or(color);
    // Length is in bytes; slicing below needs ASCII or it lands mid-char.
    if hex.len() != 6 || !hex.is_ascii() {
        return (255, 0, 0);
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Ok(r), Ok(g), Ok(b)) => (r, g, b),
        _ => (255, 0, 0),
    }
}

/// CSS rgba() string for a hex color at the given alpha.
pub fn rgba_css(color: &str, alpha: f64) -> String {
    let (r, g, b) = parse_hex_color(color);
    format!("rgba({r}, {g}, {b}, {alpha})")
}

fn stroke_path(ctx: &CanvasRenderingContext2d, from: (f64, f64), to: (f64, f64), width: f64) {
    ctx.begin_path();
    ctx.move_to(from.0, from.1);
    ctx.line_to(to.0, to.1);
    ctx.set_line_width(width);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    ctx.stroke();
}

/// Paints one stroke segment onto the mask surface.
///
/// Eraser strokes subtract alpha along the path. Brush strokes are two-pass:
/// clear the path first, then stroke it at the fixed alpha, so restroking
/// the same spot replaces rather than accumulates. The composite operation
/// is always reset to source-over before returning.
pub fn paint_segment(
    ctx: &CanvasRenderingContext2d,
    from: (f64, f64),
    to: (f64, f64),
    width: f64,
    tool: Tool,
    color: &str,
) {
    // Zero-length paths render nothing even with round caps, so a
    // pointer-down replicated as a degenerate segment becomes a dot.
    if from == to {
        paint_dot(ctx, from.0, from.1, width, tool, color);
        return;
    }
    match tool {
        Tool::Eraser => {
            let _ = ctx.set_global_composite_operation("destination-out");
            ctx.set_stroke_style_str("rgba(0, 0, 0, 1)");
            stroke_path(ctx, from, to, width);
        }
        Tool::Brush => {
            ctx.save();
            let _ = ctx.set_global_composite_operation("destination-out");
            ctx.set_stroke_style_str("rgba(0, 0, 0, 1)");
            stroke_path(ctx, from, to, width);
            ctx.restore();

            let _ = ctx.set_global_composite_operation("source-over");
            ctx.set_stroke_style_str(&rgba_css(color, FIXED_BRUSH_ALPHA));
            stroke_path(ctx, from, to, width);
        }
    }
    let _ = ctx.set_global_composite_operation("source-over");
}

/// Single dot for a pointer-down, a filled circle of radius `width / 2`
/// following the same two-pass rule as segments.
pub fn paint_dot(ctx: &CanvasRenderingContext2d, x: f64, y: f64, width: f64, tool: Tool, color: &str) {
    let fill_circle = |ctx: &CanvasRenderingContext2d| {
        ctx.begin_path();
        let _ = ctx.arc(x, y, width / 2.0, 0.0, std::f64::consts::PI * 2.0);
        ctx.fill();
    };
    match tool {
        Tool::Eraser => {
            let _ = ctx.set_global_composite_operation("destination-out");
            ctx.set_fill_style_str("rgba(0, 0, 0, 1)");
            fill_circle(ctx);
        }
        Tool::Brush => {
            ctx.save();
            let _ = ctx.set_global_composite_operation("destination-out");
            ctx.set_fill_style_str("rgba(0, 0, 0, 1)");
            fill_circle(ctx);
            ctx.restore();

            let _ = ctx.set_global_composite_operation("source-over");
            ctx.set_fill_style_str(&rgba_css(color, FIXED_BRUSH_ALPHA));
            fill_circle(ctx);
        }
    }
    let _ = ctx.set_global_composite_operation("source-over");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_is_monotone_in_brush_size() {
        for source in [ImageSource::Modal, ImageSource::StreetView] {
            let mut previous = 0.0;
            for size in 1..=10u8 {
                let width = effective_brush_width(size, 800.0, 600.0, 400.0, 300.0, source);
                assert!(width > previous, "size {size} did not grow for {source:?}");
                previous = width;
            }
        }
    }

    #[test]
    fn modal_is_exactly_one_and_a_half_times_street_view() {
        for size in 1..=10u8 {
            let modal = effective_brush_width(size, 800.0, 600.0, 400.0, 300.0, ImageSource::Modal);
            let street =
                effective_brush_width(size, 800.0, 600.0, 400.0, 300.0, ImageSource::StreetView);
            assert_eq!(modal, street * 1.5);
        }
    }

    #[test]
    fn street_view_size_five_at_half_fit_scale() {
        // 5 * 10 * 0.5 * 2 = 50
        let width =
            effective_brush_width(5, 800.0, 600.0, 400.0, 300.0, ImageSource::StreetView);
        assert_eq!(width, 50.0);
    }

    #[test]
    fn fit_scale_picks_the_constrained_axis() {
        // Wider than the canvas: constrained by width.
        assert_eq!(fit_scale(800.0, 300.0, 400.0, 300.0), 0.5);
        // Taller than the canvas: constrained by height.
        assert_eq!(fit_scale(300.0, 600.0, 400.0, 300.0), 0.5);
    }

    #[test]
    fn hex_parsing_and_fallback() {
        assert_eq!(parse_hex_color("#FF0000"), (255, 0, 0));
        assert_eq!(parse_hex_color("#4CAF50"), (76, 175, 80));
        assert_eq!(parse_hex_color("not-a-color"), (255, 0, 0));
        assert_eq!(parse_hex_color("#12345"), (255, 0, 0));
        // Six bytes but not six ASCII chars; must fall back, not panic.
        assert_eq!(parse_hex_color("#a\u{e9}a\u{e9}"), (255, 0, 0));
        assert_eq!(rgba_css("#00FF00", 0.1), "rgba(0, 255, 0, 0.1)");
    }
}
