use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use muralboard_shared::{PeerInfo, StrokeSegment, Tool};

use crate::brush;
use crate::coords;
use crate::state::Session;

/// How one remote segment is painted. Built from the message alone; the
/// receiver's own tool, color, and brush size never contribute, and the
/// coordinates and width are carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayedStroke {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub width: f64,
    pub tool: Tool,
}

impl ReplayedStroke {
    pub fn from_segment(segment: &StrokeSegment) -> Self {
        Self {
            from: (segment.from_x, segment.from_y),
            to: (segment.to_x, segment.to_y),
            width: segment.brush_width,
            tool: segment.tool,
        }
    }
}

fn ensure_bubble(
    session: &mut Session,
    document: &Document,
    user_id: &str,
    color: &str,
) -> Option<HtmlElement> {
    if let Some(bubble) = session.bubbles.get(user_id) {
        return Some(bubble.clone());
    }
    let element = document.create_element("div").ok()?;
    let bubble: HtmlElement = element.dyn_into().ok()?;
    bubble.set_class_name("drawing-bubble");
    bubble.set_text_content(Some("drawing"));
    let style = bubble.style();
    let _ = style.set_property("position", "fixed");
    let _ = style.set_property("background", color);
    let _ = style.set_property("pointer-events", "none");
    document.body()?.append_child(&bubble).ok()?;
    session.bubbles.insert(user_id.to_string(), bubble.clone());
    Some(bubble)
}

fn remove_bubble(session: &mut Session, user_id: &str) {
    if let Some(bubble) = session.bubbles.remove(user_id) {
        bubble.remove();
    }
}

fn move_bubble(session: &Session, bubble: &HtmlElement, x: f64, y: f64) {
    let Some(stack) = session.stack.as_ref() else {
        return;
    };
    let (client_x, client_y) = coords::canvas_to_client(&stack.mask, x, y);
    let style = bubble.style();
    let _ = style.set_property("left", &format!("{client_x}px"));
    let _ = style.set_property("top", &format!("{}px", client_y - 28.0));
}

/// Replays a peer's segment onto the local mask, coordinates and width
/// exactly as sent. The message carries the sender's tool, color and
/// already-scaled width; local tool state never leaks into remote strokes.
/// The sender's canvas dimensions ride along on the wire, but no rescaling
/// happens on mismatch: peers with differently fitted canvases see strokes
/// land where the sender's pixel space says, not where their own would.
pub fn handle_brush_stroke(
    session: &mut Session,
    document: &Document,
    user_id: &str,
    color: &str,
    segment: &StrokeSegment,
) {
    let replay = ReplayedStroke::from_segment(segment);
    if let Some(stack) = session.stack.as_ref() {
        brush::paint_segment(
            &stack.mask_ctx,
            replay.from,
            replay.to,
            replay.width,
            replay.tool,
            color,
        );
    }
    session
        .peers
        .record_stroke(user_id, color, replay.to.0, replay.to.1);
    if let Some(bubble) = ensure_bubble(session, document, user_id, color) {
        move_bubble(session, &bubble, replay.to.0, replay.to.1);
    }
}

pub fn handle_user_drawing(
    session: &mut Session,
    document: &Document,
    user_id: &str,
    color: &str,
    is_drawing: bool,
) {
    session.peers.set_drawing(user_id, color, is_drawing);
    if is_drawing {
        let _ = ensure_bubble(session, document, user_id, color);
    } else {
        remove_bubble(session, user_id);
    }
}

pub fn handle_mask_cleared(session: &Session) {
    if let Some(stack) = session.stack.as_ref() {
        stack.clear_mask();
    }
}

/// First message after connect: adopt our server-assigned identity, then
/// treat the rest of the snapshot as the peer roster.
pub fn handle_welcome(session: &mut Session, user: &PeerInfo, users: &[PeerInfo]) {
    session.user_id = Some(user.id.clone());
    session.user_color = user.color.clone();
    session.set_brush_size(user.brush_size);
    let self_id = user.id.clone();
    let removed = session.peers.adopt_roster(users, &self_id);
    for id in removed {
        remove_bubble(session, &id);
    }
}

pub fn handle_user_connected(session: &mut Session, user: &PeerInfo) {
    if session.user_id.as_deref() == Some(user.id.as_str()) {
        return;
    }
    session.peers.peer_joined(user);
}

/// Full roster replacement, broadcast after any disconnect. Bubbles for
/// departed peers come down with their records.
pub fn handle_users_list(session: &mut Session, users: &[PeerInfo]) {
    let self_id = session.user_id.clone().unwrap_or_default();
    let removed = session.peers.adopt_roster(users, &self_id);
    for id in removed {
        remove_bubble(session, &id);
    }
}

pub fn handle_brush_size(session: &mut Session, user_id: &str, size: u8) {
    if session.user_id.as_deref() == Some(user_id) {
        return;
    }
    session.peers.set_brush_size(user_id, size);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brush_segment() -> StrokeSegment {
        StrokeSegment {
            from_x: 10.0,
            from_y: 10.0,
            to_x: 20.0,
            to_y: 20.0,
            brush_width: 20.0,
            tool: Tool::Brush,
            canvas_width: 400,
            canvas_height: 300,
            from_modal: false,
        }
    }

    #[test]
    fn replay_uses_the_message_tool_not_the_receivers() {
        let mut session = Session::new();
        session.tool = Tool::Eraser;
        session.brush_size = 1;

        let replay = ReplayedStroke::from_segment(&brush_segment());

        assert_eq!(replay.tool, Tool::Brush);
        assert_ne!(replay.tool, session.tool);
    }

    #[test]
    fn replay_carries_coordinates_and_width_unchanged() {
        let segment = brush_segment();
        let replay = ReplayedStroke::from_segment(&segment);
        assert_eq!(replay.from, (10.0, 10.0));
        assert_eq!(replay.to, (20.0, 20.0));
        assert_eq!(replay.width, segment.brush_width);
    }
}
