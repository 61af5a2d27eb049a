//! Newline-delimited JSON framing: inbound message events in, outbound
//! gateway actions out.

use crate::gateway::OutboundAction;
use crate::types::{BotError, BotResult, InboundMessage};

/// Parse a single line of text as an inbound message event.
pub fn parse_event(line: &str) -> BotResult<InboundMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(BotError::Internal("Empty event".to_string()));
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Serialize an action to a JSON line (with trailing newline).
pub fn frame_action(action: &OutboundAction) -> BotResult<String> {
    let mut json = serde_json::to_string(action)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;

    #[test]
    fn test_parse_event() {
        let line = r#"{"group":1,"channel":2,"author":{"id":3,"name":"keele","manage_group":true},"content":"!t-conf"}"#;
        let event = parse_event(line).unwrap();
        assert_eq!(event.channel, 2);
        assert!(event.author.manage_group);
        assert_eq!(event.content, "!t-conf");
    }

    #[test]
    fn test_parse_event_rejects_garbage() {
        assert!(parse_event("   ").is_err());
        assert!(matches!(parse_event("{not json"), Err(BotError::Json(_))));
        assert!(parse_event(r#"{"group":1}"#).is_err());
    }

    #[test]
    fn test_frame_action_is_one_line() {
        let framed = frame_action(&OutboundAction::Send {
            channel: 2,
            id: 9,
            content: Content::text("line one\nline two"),
        })
        .unwrap();
        assert!(framed.ends_with('\n'));
        assert_eq!(framed.matches('\n').count(), 1);
        let value: serde_json::Value = serde_json::from_str(&framed).unwrap();
        assert_eq!(value["action"], "send");
        assert_eq!(value["content"]["text"], "line one\nline two");
    }
}
