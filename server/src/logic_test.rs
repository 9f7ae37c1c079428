use super::*;
use muralboard_shared::Tool;

fn sender() -> PeerInfo {
    PeerInfo {
        id: "peer-1".to_string(),
        color: "#FF0000".to_string(),
        brush_size: 5,
        connected_at: "0".to_string(),
    }
}

fn segment() -> StrokeSegment {
    StrokeSegment {
        from_x: 1.0,
        from_y: 2.0,
        to_x: 3.0,
        to_y: 4.0,
        brush_width: 50.0,
        tool: Tool::Brush,
        canvas_width: 400,
        canvas_height: 300,
        from_modal: false,
    }
}

#[test]
fn brush_stroke_relays_to_others_with_sender_identity() {
    let reply = apply_client_message(&sender(), ClientMessage::BrushStroke { segment: segment() });
    match reply {
        Some(Reply::Broadcast(ServerMessage::BrushStroke { user_id, color, .. }, fanout)) => {
            assert_eq!(user_id, "peer-1");
            assert_eq!(color, "#FF0000");
            assert_eq!(fanout, Fanout::Others);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn non_finite_segment_is_dropped() {
    let mut bad = segment();
    bad.to_x = f64::NAN;
    assert!(apply_client_message(&sender(), ClientMessage::BrushStroke { segment: bad }).is_none());
}

#[test]
fn oversized_brush_width_is_clamped() {
    let mut wide = segment();
    wide.brush_width = 10_000.0;
    let reply = apply_client_message(&sender(), ClientMessage::BrushStroke { segment: wide });
    match reply {
        Some(Reply::Broadcast(ServerMessage::BrushStroke { segment, .. }, _)) => {
            assert_eq!(segment.brush_width, 600.0);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn drawing_state_relays_to_others() {
    for (message, expected) in [
        (ClientMessage::StartDrawing, true),
        (ClientMessage::StopDrawing, false),
    ] {
        match apply_client_message(&sender(), message) {
            Some(Reply::Broadcast(
                ServerMessage::UserDrawing { is_drawing, .. },
                Fanout::Others,
            )) => {
                assert_eq!(is_drawing, expected);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}

#[test]
fn generated_image_reaches_everyone() {
    let reply = apply_client_message(
        &sender(),
        ClientMessage::ImageGenerated {
            image_url: "https://example.com/out.png".to_string(),
            prompt: "a mural".to_string(),
            negative_prompt: String::new(),
        },
    );
    match reply {
        Some(Reply::Broadcast(ServerMessage::ImageGenerated { .. }, fanout)) => {
            assert_eq!(fanout, Fanout::All);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn brush_size_is_clamped_and_recorded() {
    match apply_client_message(&sender(), ClientMessage::UpdateBrushSize { size: 200 }) {
        Some(Reply::BrushSize(size)) => assert_eq!(size, 10),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn location_without_panorama_is_rejected() {
    let reply = apply_client_message(
        &sender(),
        ClientMessage::LocationUpdate {
            lat: 51.5,
            lng: -0.1,
            panorama_id: None,
            heading: Some(90.0),
            image_url: None,
        },
    );
    assert!(reply.is_none());

    let reply = apply_client_message(
        &sender(),
        ClientMessage::LocationUpdate {
            lat: 51.5,
            lng: -0.1,
            panorama_id: Some("pano-1".to_string()),
            heading: Some(90.0),
            image_url: None,
        },
    );
    assert!(matches!(
        reply,
        Some(Reply::Broadcast(
            ServerMessage::LocationUpdated { .. },
            Fanout::Others
        ))
    ));
}

#[test]
fn image_upload_rejects_non_http_urls() {
    let reply = apply_client_message(
        &sender(),
        ClientMessage::ImageUpload {
            image_url: "javascript:alert(1)".to_string(),
        },
    );
    assert!(reply.is_none());
}

#[test]
fn submission_is_stored_after_sanitizing() {
    let submission = Submission {
        id: "sub-1".to_string(),
        image_url: "https://example.com/a.png".to_string(),
        prompt: "prompt".to_string(),
        lat: 1.0,
        lng: 2.0,
        created_at: "now".to_string(),
    };
    match apply_client_message(
        &sender(),
        ClientMessage::SubmissionCreated {
            submission: submission.clone(),
        },
    ) {
        Some(Reply::StoreSubmission(stored)) => assert_eq!(stored, submission),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn get_submissions_goes_back_to_sender() {
    assert!(matches!(
        apply_client_message(&sender(), ClientMessage::GetSubmissions),
        Some(Reply::Submissions)
    ));
}
