//! Decoding of frames into typed events

use serde::de::DeserializeOwned;

use super::types::{DecodeError, Event, Frame};

/// Decode a frame by its event label
pub fn decode(frame: &Frame) -> Result<Event, DecodeError> {
    match frame.event.as_str() {
        "update" => parse(frame).map(Event::Update),
        "notification" => parse(frame).map(Event::Notification),
        "delete" => parse(frame).map(Event::Delete),
        other => Err(DecodeError::UnknownEventType(other.to_string())),
    }
}

fn parse<T: DeserializeOwned>(frame: &Frame) -> Result<T, DecodeError> {
    serde_json::from_slice(&frame.data).map_err(|source| DecodeError::Json {
        event: frame.event.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_update() {
        let event = decode(&Frame::new("update", r#"{"content":"foo"}"#)).unwrap();

        match event {
            Event::Update(status) => assert_eq!(status.content, "foo"),
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_notification() {
        let frame = Frame::new(
            "notification",
            r#"{"id":"3","type":"mention","status":{"content":"hi @me"}}"#,
        );

        match decode(&frame).unwrap() {
            Event::Notification(n) => {
                assert_eq!(n.id, 3);
                assert_eq!(n.notification_type, "mention");
                assert_eq!(n.status.unwrap().content, "hi @me");
            }
            other => panic!("expected notification, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_delete() {
        match decode(&Frame::new("delete", "1234")).unwrap() {
            Event::Delete(id) => assert_eq!(id, 1234),
            other => panic!("expected delete, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_type() {
        let err = decode(&Frame::new("heartbeat", "{}")).unwrap_err();

        assert!(matches!(err, DecodeError::UnknownEventType(ref e) if e == "heartbeat"));
        assert_eq!(err.to_string(), "unknown event type: \"heartbeat\"");
    }

    #[test]
    fn test_missing_required_field() {
        let err = decode(&Frame::new("update", r#"{"id":1}"#)).unwrap_err();

        assert!(matches!(err, DecodeError::Json { ref event, .. } if event == "update"));
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(decode(&Frame::new("update", "{not json")).is_err());
        assert!(decode(&Frame::new("delete", r#"{"id":1}"#)).is_err());
        assert!(decode(&Frame::new("update", "")).is_err());
        assert!(decode(&Frame::new("notification", vec![0xff, 0xfe])).is_err());
    }
}
