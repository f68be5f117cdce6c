//! LINE webhook payload: the batch of events delivered on one callback.

use serde::Deserialize;

/// Webhook POST body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Bot user id the events are addressed to.
    #[serde(default)]
    pub destination: Option<String>,
    pub events: Vec<InboundEvent>,
}

/// One received notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub kind: EventType,
    /// Single-use token for replying; absent for unfollow/leave.
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    /// Present only for message events.
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EventType {
    Message,
    Follow,
    Unfollow,
    Join,
    Leave,
    Postback,
    Beacon,
    /// Event types this bot does not know about (e.g. memberJoined).
    Other(String),
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "message" => EventType::Message,
            "follow" => EventType::Follow,
            "unfollow" => EventType::Unfollow,
            "join" => EventType::Join,
            "leave" => EventType::Leave,
            "postback" => EventType::Postback,
            "beacon" => EventType::Beacon,
            _ => EventType::Other(s),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventType::Message => "message",
            EventType::Follow => "follow",
            EventType::Unfollow => "unfollow",
            EventType::Join => "join",
            EventType::Leave => "leave",
            EventType::Postback => "postback",
            EventType::Beacon => "beacon",
            EventType::Other(s) => s.as_str(),
        };
        f.write_str(name)
    }
}

/// Who sent the event (user, group or room).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

/// Message body, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text(TextMessage),
    Image(MediaMessage),
    Video(MediaMessage),
    Audio(MediaMessage),
    Location(LocationMessage),
    Sticker(StickerMessage),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextMessage {
    #[serde(default)]
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaMessage {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub package_id: String,
    #[serde(default)]
    pub sticker_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "destination": "U0000",
        "events": [
            {
                "type": "message",
                "replyToken": "r1",
                "source": { "type": "user", "userId": "U1" },
                "timestamp": 1462629479859,
                "message": { "type": "text", "id": "m1", "text": "今天吃什麼" }
            },
            {
                "type": "message",
                "replyToken": "r2",
                "source": { "type": "group", "groupId": "G1", "userId": "U2" },
                "timestamp": 1462629479860,
                "message": {
                    "type": "location", "id": "m2", "title": "my location",
                    "address": "Taipei", "latitude": 25.033, "longitude": 121.5654
                }
            },
            {
                "type": "message",
                "replyToken": "r3",
                "source": { "type": "user", "userId": "U3" },
                "message": { "type": "sticker", "id": "m3", "packageId": "1", "stickerId": "2" }
            },
            {
                "type": "message",
                "replyToken": "r4",
                "source": { "type": "user", "userId": "U4" },
                "message": { "type": "file", "id": "m4", "fileName": "a.pdf", "fileSize": 10 }
            },
            { "type": "unfollow", "source": { "type": "user", "userId": "U5" } },
            { "type": "memberJoined", "replyToken": "r6", "source": { "type": "group", "groupId": "G1" } }
        ]
    }"#;

    #[test]
    fn parses_mixed_batch() {
        let payload: WebhookPayload = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(payload.destination.as_deref(), Some("U0000"));
        assert_eq!(payload.events.len(), 6);

        let first = &payload.events[0];
        assert_eq!(first.kind, EventType::Message);
        assert_eq!(first.reply_token.as_deref(), Some("r1"));
        match &first.message {
            Some(Message::Text(t)) => assert_eq!(t.text, "今天吃什麼"),
            other => panic!("expected text, got {:?}", other),
        }

        match &payload.events[1].message {
            Some(Message::Location(l)) => {
                assert!((l.latitude - 25.033).abs() < 1e-9);
                assert!((l.longitude - 121.5654).abs() < 1e-9);
                assert_eq!(l.address.as_deref(), Some("Taipei"));
            }
            other => panic!("expected location, got {:?}", other),
        }
        assert_eq!(
            payload.events[1].source.as_ref().and_then(|s| s.group_id.as_deref()),
            Some("G1")
        );

        match &payload.events[2].message {
            Some(Message::Sticker(s)) => assert_eq!(s.sticker_id, "2"),
            other => panic!("expected sticker, got {:?}", other),
        }
        assert!(matches!(payload.events[3].message, Some(Message::Unknown)));

        assert_eq!(payload.events[4].kind, EventType::Unfollow);
        assert!(payload.events[4].reply_token.is_none());
        assert_eq!(
            payload.events[5].kind,
            EventType::Other("memberJoined".to_string())
        );
    }

    #[test]
    fn event_type_display_round_trips_name() {
        assert_eq!(EventType::from("postback".to_string()).to_string(), "postback");
        assert_eq!(EventType::from("things".to_string()).to_string(), "things");
    }
}
