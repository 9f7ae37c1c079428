use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod votes;

pub use votes::{VoteDirection, VoteRecord, VoteTally};

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Brush,
    Eraser,
}

/// Where the currently mounted base image came from. Modal gallery images are
/// historically lower resolution than Street View captures, so the brush
/// engine widens strokes on them (3x vs 2x).
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Modal,
    StreetView,
    PeerUpload,
    PeerGenerated,
}

impl ImageSource {
    /// Peer uploads originate from a peer's modal gallery, so they inherit
    /// the modal multiplier. Generated images come back at capture
    /// resolution and use the street-view multiplier.
    pub fn is_modal(self) -> bool {
        matches!(self, ImageSource::Modal | ImageSource::PeerUpload)
    }

    pub fn brush_multiplier(self) -> f64 {
        if self.is_modal() {
            3.0
        } else {
            2.0
        }
    }
}

/// One incremental paint operation between two consecutive pointer samples,
/// in the sender's canvas pixel space. `canvas_width`/`canvas_height`
/// describe that space; receivers replay coordinates and width as sent, so
/// a segment only lands faithfully on a canvas of matching dimensions.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct StrokeSegment {
    pub from_x: f64,
    pub from_y: f64,
    pub to_x: f64,
    pub to_y: f64,
    pub brush_width: f64,
    pub tool: Tool,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub from_modal: bool,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct PeerInfo {
    pub id: String,
    pub color: String,
    pub brush_size: u8,
    pub connected_at: String,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct Submission {
    pub id: String,
    pub image_url: String,
    pub prompt: String,
    pub lat: f64,
    pub lng: f64,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "brush:stroke")]
    BrushStroke { segment: StrokeSegment },
    #[serde(rename = "drawing:start")]
    StartDrawing,
    #[serde(rename = "drawing:stop")]
    StopDrawing,
    #[serde(rename = "mask:clear")]
    ClearMask,
    #[serde(rename = "brush:size")]
    UpdateBrushSize { size: u8 },
    #[serde(rename = "image:upload")]
    ImageUpload { image_url: String },
    #[serde(rename = "image:generated")]
    ImageGenerated {
        image_url: String,
        prompt: String,
        negative_prompt: String,
    },
    #[serde(rename = "location:update")]
    LocationUpdate {
        lat: f64,
        lng: f64,
        panorama_id: Option<String>,
        heading: Option<f64>,
        image_url: Option<String>,
    },
    #[serde(rename = "submissions:get")]
    GetSubmissions,
    #[serde(rename = "submission:create")]
    SubmissionCreated { submission: Submission },
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent once to a freshly connected peer: its own identity plus the full
    /// roster (the new peer included).
    #[serde(rename = "welcome")]
    Welcome {
        user: PeerInfo,
        users: Vec<PeerInfo>,
    },
    #[serde(rename = "user:connected")]
    UserConnected { user: PeerInfo },
    #[serde(rename = "users:list")]
    UsersList { users: Vec<PeerInfo> },
    #[serde(rename = "brush:stroke")]
    BrushStroke {
        user_id: String,
        color: String,
        segment: StrokeSegment,
    },
    #[serde(rename = "user:drawing")]
    UserDrawing {
        user_id: String,
        color: String,
        is_drawing: bool,
    },
    #[serde(rename = "mask:cleared")]
    MaskCleared { user_id: String, color: String },
    #[serde(rename = "brush:size")]
    BrushSizeUpdated { user_id: String, size: u8 },
    #[serde(rename = "image:uploaded")]
    ImageUploaded { user_id: String, image_url: String },
    #[serde(rename = "image:generated")]
    ImageGenerated {
        user_id: String,
        image_url: String,
        prompt: String,
        negative_prompt: String,
    },
    #[serde(rename = "location:updated")]
    LocationUpdated {
        user_id: String,
        lat: f64,
        lng: f64,
        panorama_id: String,
        heading: f64,
        image_url: Option<String>,
    },
    #[serde(rename = "submissions:list")]
    SubmissionsList { submissions: Vec<Submission> },
    #[serde(rename = "submission:created")]
    SubmissionCreated { submission: Submission },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brush_multiplier_ratio_is_three_to_two() {
        assert_eq!(ImageSource::Modal.brush_multiplier(), 3.0);
        assert_eq!(ImageSource::PeerUpload.brush_multiplier(), 3.0);
        assert_eq!(ImageSource::StreetView.brush_multiplier(), 2.0);
        assert_eq!(ImageSource::PeerGenerated.brush_multiplier(), 2.0);
        assert_eq!(
            ImageSource::Modal.brush_multiplier() / ImageSource::StreetView.brush_multiplier(),
            1.5
        );
    }

    #[test]
    fn client_message_json_shape() {
        let message = ClientMessage::BrushStroke {
            segment: StrokeSegment {
                from_x: 10.0,
                from_y: 10.0,
                to_x: 20.0,
                to_y: 20.0,
                brush_width: 50.0,
                tool: Tool::Brush,
                canvas_width: 400,
                canvas_height: 300,
                from_modal: false,
            },
        };
        let json = serde_json::to_string(&message).expect("serialize");
        assert!(json.contains("\"type\":\"brush:stroke\""));
        let restored: ClientMessage = serde_json::from_str(&json).expect("deserialize");
        match restored {
            ClientMessage::BrushStroke { segment } => {
                assert_eq!(segment.brush_width, 50.0);
                assert_eq!(segment.tool, Tool::Brush);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn server_message_bincode_round_trip() {
        let message = ServerMessage::MaskCleared {
            user_id: "abcd".into(),
            color: "#FF0000".into(),
        };
        let bytes =
            bincode::encode_to_vec(&message, bincode::config::standard()).expect("encode");
        let (restored, _): (ServerMessage, _) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).expect("decode");
        match restored {
            ServerMessage::MaskCleared { user_id, color } => {
                assert_eq!(user_id, "abcd");
                assert_eq!(color, "#FF0000");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
