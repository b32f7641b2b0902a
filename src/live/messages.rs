use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::LiveSettings;

/// A message queued for upload to the live session.
///
/// Media chunks (frames, microphone audio) and direct user text share one
/// queue so the send duty preserves enqueue order across sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Compressed frame or raw PCM chunk with its mime type
    Media { mime_type: String, data: Vec<u8> },
    /// User-typed text that closes the current input turn
    UserText { text: String },
}

/// One event from the remote session's response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Text fragment of the in-progress turn
    Text(String),
    /// PCM audio chunk destined for playback
    Audio(Vec<u8>),
    /// The remote side closed the current turn
    TurnComplete,
}

/// A function declaration advertised to the model in the setup message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the function parameters
    pub parameters: Value,
}

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Build the setup message that opens a live session.
///
/// Response modality is TEXT; spoken output is configured through the voice
/// selection but the model replies with text fragments plus optional inline
/// audio.
pub fn setup_message(settings: &LiveSettings, tools: &[ToolDeclaration]) -> Value {
    let mut tool_list = Vec::new();
    if settings.google_search {
        tool_list.push(json!({ "google_search": {} }));
    }
    if !tools.is_empty() {
        tool_list.push(json!({
            "function_declarations": tools,
        }));
    }

    let mut setup = json!({
        "setup": {
            "model": settings.model,
            "generationConfig": {
                "responseModalities": ["TEXT"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": settings.voice }
                    }
                }
            },
            "tools": tool_list,
        }
    });

    if let Some(instruction) = &settings.system_instruction {
        setup["setup"]["systemInstruction"] = json!({
            "parts": [{ "text": instruction }]
        });
    }

    setup
}

/// Encode an outbound message into its wire form.
pub fn encode_outbound(msg: &OutboundMessage) -> Value {
    match msg {
        OutboundMessage::Media { mime_type, data } => json!({
            "realtimeInput": {
                "mediaChunks": [{
                    "mimeType": mime_type,
                    "data": b64(data),
                }]
            }
        }),
        OutboundMessage::UserText { text } => json!({
            "clientContent": {
                "turns": [{
                    "role": "user",
                    "parts": [{ "text": text }]
                }],
                "turnComplete": true
            }
        }),
    }
}

/// Check whether a server message acknowledges the setup handshake.
pub fn is_setup_complete(msg: &str) -> bool {
    msg.contains("setupComplete")
}

/// Extract an error message if the server reported one.
pub fn parse_error(msg: &str) -> Option<String> {
    let json: Value = serde_json::from_str(msg).ok()?;
    let error = json.get("error")?;
    if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
        return Some(message.to_string());
    }
    Some(error.to_string())
}

/// Parse the events carried by one server message, in wire order.
///
/// A message may carry several parts; a turn-complete marker is always
/// yielded last so the demux never observes content after the boundary.
pub fn parse_server_events(msg: &str) -> Vec<ServerEvent> {
    let mut events = Vec::new();

    let Ok(json) = serde_json::from_str::<Value>(msg) else {
        return events;
    };
    let Some(server_content) = json.get("serverContent") else {
        return events;
    };

    if let Some(parts) = server_content
        .get("modelTurn")
        .and_then(|turn| turn.get("parts"))
        .and_then(|p| p.as_array())
    {
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                // Leading spaces are intentional word separators; only skip
                // fragments that are purely whitespace.
                if !text.chars().all(char::is_whitespace) {
                    events.push(ServerEvent::Text(text.to_string()));
                }
            }
            if let Some(data) = part
                .get("inlineData")
                .and_then(|inline| inline.get("data"))
                .and_then(|d| d.as_str())
            {
                if let Ok(pcm) = base64::engine::general_purpose::STANDARD.decode(data) {
                    events.push(ServerEvent::Audio(pcm));
                }
            }
        }
    }

    let turn_complete = ["turnComplete", "generationComplete"]
        .iter()
        .any(|key| {
            server_content
                .get(key)
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        });
    if turn_complete {
        events.push(ServerEvent::TurnComplete);
    }

    events
}
