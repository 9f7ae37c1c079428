use web_sys::CanvasRenderingContext2d;

use crate::canvas::CanvasStack;

fn outline_circle(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, color: &str) {
    ctx.begin_path();
    let _ = ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU);
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(1.0);
    ctx.stroke();
}

/// Redraws the local brush outline at the pointer position. The cursor
/// layer holds nothing else, so a full clear per frame is fine.
pub fn update_cursor(stack: &CanvasStack, x: f64, y: f64, brush_width: f64, color: &str) {
    stack.clear_cursor();
    outline_circle(&stack.cursor_ctx, x, y, brush_width / 2.0, color);
}

pub fn clear_cursor(stack: &CanvasStack) {
    stack.clear_cursor();
}

/// Shows the brush size in the middle of the canvas while the slider is
/// being dragged, so the user sees the footprint without painting.
pub fn preview_at_center(stack: &CanvasStack, brush_width: f64, color: &str, size: u8) {
    stack.clear_cursor();
    let cx = f64::from(stack.width) / 2.0;
    let cy = f64::from(stack.height) / 2.0;
    outline_circle(&stack.cursor_ctx, cx, cy, brush_width / 2.0, color);
    stack.cursor_ctx.set_fill_style_str(color);
    stack.cursor_ctx.set_font("14px sans-serif");
    stack.cursor_ctx.set_text_align("center");
    let label = format!("Size: {size}");
    let _ = stack
        .cursor_ctx
        .fill_text(&label, cx, cy - brush_width / 2.0 - 8.0);
}
