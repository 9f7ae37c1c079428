use muralboard_shared::{ClientMessage, PeerInfo, ServerMessage, StrokeSegment, Submission};

/// Who a relayed message goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fanout {
    Others,
    All,
}

/// What the socket loop should do with one inbound message.
#[derive(Debug)]
pub enum Reply {
    Broadcast(ServerMessage, Fanout),
    /// Send the current submissions list back to the sender only.
    Submissions,
    /// Persist the submission, then broadcast it to the other peers.
    StoreSubmission(Submission),
    /// The sender changed its brush size; remember it on the peer record.
    BrushSize(u8),
}

const MAX_URL_LEN: usize = 4096;
// Generated images often arrive as inline data URLs; these are megabytes.
const MAX_DATA_URL_LEN: usize = 8 * 1024 * 1024;
const MAX_TEXT_LEN: usize = 2048;
const MAX_BRUSH_WIDTH: f64 = 600.0;

/// Translates one client message into its relay plan. Pure: peer bookkeeping
/// and persistence happen in the socket loop based on the returned `Reply`.
/// Malformed messages map to `None` and are dropped silently.
pub fn apply_client_message(sender: &PeerInfo, message: ClientMessage) -> Option<Reply> {
    match message {
        ClientMessage::BrushStroke { segment } => {
            let segment = sanitize_segment(segment)?;
            Some(Reply::Broadcast(
                ServerMessage::BrushStroke {
                    user_id: sender.id.clone(),
                    color: sender.color.clone(),
                    segment,
                },
                Fanout::Others,
            ))
        }
        ClientMessage::StartDrawing => Some(Reply::Broadcast(
            ServerMessage::UserDrawing {
                user_id: sender.id.clone(),
                color: sender.color.clone(),
                is_drawing: true,
            },
            Fanout::Others,
        )),
        ClientMessage::StopDrawing => Some(Reply::Broadcast(
            ServerMessage::UserDrawing {
                user_id: sender.id.clone(),
                color: sender.color.clone(),
                is_drawing: false,
            },
            Fanout::Others,
        )),
        ClientMessage::ClearMask => Some(Reply::Broadcast(
            ServerMessage::MaskCleared {
                user_id: sender.id.clone(),
                color: sender.color.clone(),
            },
            Fanout::Others,
        )),
        ClientMessage::UpdateBrushSize { size } => {
            let size = size.clamp(1, 10);
            Some(Reply::BrushSize(size))
        }
        ClientMessage::ImageUpload { image_url } => {
            let image_url = sanitize_url(image_url)?;
            Some(Reply::Broadcast(
                ServerMessage::ImageUploaded {
                    user_id: sender.id.clone(),
                    image_url,
                },
                Fanout::Others,
            ))
        }
        ClientMessage::ImageGenerated {
            image_url,
            prompt,
            negative_prompt,
        } => {
            let image_url = sanitize_url(image_url)?;
            // Everyone, sender included, loads generated images through the
            // same broadcast path.
            Some(Reply::Broadcast(
                ServerMessage::ImageGenerated {
                    user_id: sender.id.clone(),
                    image_url,
                    prompt: truncate(prompt),
                    negative_prompt: truncate(negative_prompt),
                },
                Fanout::All,
            ))
        }
        ClientMessage::LocationUpdate {
            lat,
            lng,
            panorama_id,
            heading,
            image_url,
        } => {
            if !lat.is_finite() || !lng.is_finite() {
                return None;
            }
            // A location without panorama data is useless to peers.
            let panorama_id = panorama_id.filter(|id| !id.is_empty())?;
            let heading = heading.filter(|value| value.is_finite())?;
            let image_url = match image_url {
                Some(url) => Some(sanitize_url(url)?),
                None => None,
            };
            Some(Reply::Broadcast(
                ServerMessage::LocationUpdated {
                    user_id: sender.id.clone(),
                    lat,
                    lng,
                    panorama_id,
                    heading,
                    image_url,
                },
                Fanout::Others,
            ))
        }
        ClientMessage::GetSubmissions => Some(Reply::Submissions),
        ClientMessage::SubmissionCreated { submission } => {
            let submission = sanitize_submission(submission)?;
            Some(Reply::StoreSubmission(submission))
        }
    }
}

fn sanitize_segment(segment: StrokeSegment) -> Option<StrokeSegment> {
    let coords = [segment.from_x, segment.from_y, segment.to_x, segment.to_y];
    if coords.iter().any(|value| !value.is_finite()) {
        return None;
    }
    if !segment.brush_width.is_finite() || segment.brush_width <= 0.0 {
        return None;
    }
    if segment.canvas_width == 0 || segment.canvas_height == 0 {
        return None;
    }
    Some(StrokeSegment {
        brush_width: segment.brush_width.min(MAX_BRUSH_WIDTH),
        ..segment
    })
}

fn sanitize_url(url: String) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    if url.starts_with("data:image/") {
        return (url.len() <= MAX_DATA_URL_LEN).then_some(url);
    }
    if (url.starts_with("http://") || url.starts_with("https://")) && url.len() <= MAX_URL_LEN {
        Some(url)
    } else {
        None
    }
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_TEXT_LEN {
        let mut cut = MAX_TEXT_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

fn sanitize_submission(mut submission: Submission) -> Option<Submission> {
    if submission.id.is_empty() || submission.id.len() > 64 {
        return None;
    }
    submission.image_url = sanitize_url(submission.image_url)?;
    if !submission.lat.is_finite() || !submission.lng.is_finite() {
        return None;
    }
    submission.prompt = truncate(submission.prompt);
    Some(submission)
}

#[cfg(test)]
#[path = "logic_test.rs"]
mod tests;
