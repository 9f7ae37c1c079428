use std::collections::HashMap;

use muralboard_shared::PeerInfo;

/// What we track locally about one remote peer. Stroke continuity lives
/// here so a peer's segments chain together even when frames interleave
/// with other peers' traffic.
#[derive(Debug, Clone)]
pub struct PresenceRecord {
    pub color: String,
    pub brush_size: u8,
    pub last_x: Option<f64>,
    pub last_y: Option<f64>,
    pub is_drawing: bool,
}

impl PresenceRecord {
    fn from_info(info: &PeerInfo) -> Self {
        Self {
            color: info.color.clone(),
            brush_size: info.brush_size,
            last_x: None,
            last_y: None,
            is_drawing: false,
        }
    }
}

/// Roster of remote peers keyed by server-assigned id. The local user is
/// never stored here.
#[derive(Debug, Default)]
pub struct PresenceMap {
    peers: HashMap<String, PresenceRecord>,
}

impl PresenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&PresenceRecord> {
        self.peers.get(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Replaces the roster with a fresh server snapshot, skipping `self_id`.
    /// Known peers keep their in-flight stroke state; peers absent from the
    /// snapshot are dropped and their ids returned so the caller can tear
    /// down any DOM attached to them.
    pub fn adopt_roster(&mut self, users: &[PeerInfo], self_id: &str) -> Vec<String> {
        let mut fresh = HashMap::new();
        for info in users {
            if info.id == self_id {
                continue;
            }
            let record = match self.peers.remove(&info.id) {
                Some(mut existing) => {
                    existing.color = info.color.clone();
                    existing.brush_size = info.brush_size;
                    existing
                }
                None => PresenceRecord::from_info(info),
            };
            fresh.insert(info.id.clone(), record);
        }
        let removed: Vec<String> = self.peers.keys().cloned().collect();
        self.peers = fresh;
        removed
    }

    pub fn peer_joined(&mut self, info: &PeerInfo) {
        self.peers
            .insert(info.id.clone(), PresenceRecord::from_info(info));
    }

    /// Remembers where a peer's stroke ended. Creates the record on the fly
    /// when a stroke arrives before any roster mention of its author.
    pub fn record_stroke(&mut self, id: &str, color: &str, to_x: f64, to_y: f64) {
        let record = self
            .peers
            .entry(id.to_string())
            .or_insert_with(|| PresenceRecord {
                color: color.to_string(),
                brush_size: 5,
                last_x: None,
                last_y: None,
                is_drawing: true,
            });
        record.color = color.to_string();
        record.last_x = Some(to_x);
        record.last_y = Some(to_y);
    }

    pub fn set_drawing(&mut self, id: &str, color: &str, is_drawing: bool) {
        let record = self
            .peers
            .entry(id.to_string())
            .or_insert_with(|| PresenceRecord {
                color: color.to_string(),
                brush_size: 5,
                last_x: None,
                last_y: None,
                is_drawing: false,
            });
        record.is_drawing = is_drawing;
        if !is_drawing {
            record.last_x = None;
            record.last_y = None;
        }
    }

    pub fn set_brush_size(&mut self, id: &str, size: u8) {
        if let Some(record) = self.peers.get_mut(id) {
            record.brush_size = size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str, color: &str) -> PeerInfo {
        PeerInfo {
            id: id.to_string(),
            color: color.to_string(),
            brush_size: 5,
            connected_at: String::new(),
        }
    }

    #[test]
    fn roster_skips_self_and_reports_departures() {
        let mut map = PresenceMap::new();
        map.peer_joined(&info("a", "#FF0000"));
        map.peer_joined(&info("b", "#00FF00"));

        let removed = map.adopt_roster(&[info("a", "#FF0000"), info("me", "#0000FF")], "me");

        assert_eq!(removed, vec!["b".to_string()]);
        assert!(map.get("a").is_some());
        assert!(map.get("me").is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn roster_preserves_in_flight_stroke_state() {
        let mut map = PresenceMap::new();
        map.peer_joined(&info("a", "#FF0000"));
        map.set_drawing("a", "#FF0000", true);
        map.record_stroke("a", "#FF0000", 12.0, 34.0);

        map.adopt_roster(&[info("a", "#AA0000")], "me");

        let record = map.get("a").unwrap();
        assert_eq!(record.color, "#AA0000");
        assert_eq!(record.last_x, Some(12.0));
        assert!(record.is_drawing);
    }

    #[test]
    fn stroke_before_roster_creates_record() {
        let mut map = PresenceMap::new();
        map.record_stroke("ghost", "#00FFFF", 1.0, 2.0);
        let record = map.get("ghost").unwrap();
        assert_eq!(record.color, "#00FFFF");
        assert_eq!(record.last_y, Some(2.0));
    }

    #[test]
    fn stop_drawing_clears_continuity() {
        let mut map = PresenceMap::new();
        map.record_stroke("a", "#FF0000", 5.0, 5.0);
        map.set_drawing("a", "#FF0000", false);
        let record = map.get("a").unwrap();
        assert!(record.last_x.is_none() && record.last_y.is_none());
        assert!(!record.is_drawing);
    }
}
