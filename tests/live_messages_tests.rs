// Wire-format tests for the live transport messages.

use base64::Engine;
use serde_json::json;

use glance::config::LiveSettings;
use glance::live::messages::{
    encode_outbound, is_setup_complete, parse_error, parse_server_events, setup_message,
};
use glance::{OutboundMessage, ServerEvent, ToolDeclaration};

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

#[test]
fn test_setup_message_core_fields() {
    let settings = LiveSettings::default();
    let setup = setup_message(&settings, &[]);

    assert_eq!(setup["setup"]["model"], json!("models/gemini-2.0-flash-exp"));
    assert_eq!(
        setup["setup"]["generationConfig"]["responseModalities"],
        json!(["TEXT"])
    );
    assert_eq!(
        setup["setup"]["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
            ["voiceName"],
        json!("Puck")
    );
    // Google Search grounding is on by default.
    assert_eq!(setup["setup"]["tools"][0], json!({ "google_search": {} }));
    // No system instruction unless configured.
    assert!(setup["setup"].get("systemInstruction").is_none());
}

#[test]
fn test_setup_message_with_instruction_and_tools() {
    let settings = LiveSettings {
        system_instruction: Some("Answer briefly.".to_string()),
        google_search: false,
        ..LiveSettings::default()
    };
    let tools = vec![ToolDeclaration {
        name: "getWeather".to_string(),
        description: "gets the weather for a requested city".to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": { "city": { "type": "STRING" } }
        }),
    }];

    let setup = setup_message(&settings, &tools);

    assert_eq!(
        setup["setup"]["systemInstruction"]["parts"][0]["text"],
        json!("Answer briefly.")
    );
    let declarations = &setup["setup"]["tools"][0]["function_declarations"];
    assert_eq!(declarations[0]["name"], json!("getWeather"));
    assert!(setup["setup"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .all(|tool| tool.get("google_search").is_none()));
}

#[test]
fn test_encode_media_chunk() {
    let msg = OutboundMessage::Media {
        mime_type: "image/jpeg".to_string(),
        data: vec![1, 2, 3],
    };
    let encoded = encode_outbound(&msg);

    let chunk = &encoded["realtimeInput"]["mediaChunks"][0];
    assert_eq!(chunk["mimeType"], json!("image/jpeg"));
    assert_eq!(chunk["data"], json!(b64(&[1, 2, 3])));
}

#[test]
fn test_encode_user_text_closes_turn() {
    let msg = OutboundMessage::UserText {
        text: "what is on my screen?".to_string(),
    };
    let encoded = encode_outbound(&msg);

    let content = &encoded["clientContent"];
    assert_eq!(content["turnComplete"], json!(true));
    assert_eq!(content["turns"][0]["role"], json!("user"));
    assert_eq!(
        content["turns"][0]["parts"][0]["text"],
        json!("what is on my screen?")
    );
}

#[test]
fn test_parse_text_and_audio_parts_in_order() {
    let msg = json!({
        "serverContent": {
            "modelTurn": {
                "parts": [
                    { "text": "Hello" },
                    { "inlineData": { "mimeType": "audio/pcm", "data": b64(&[7, 8, 9]) } },
                    { "text": " world" }
                ]
            }
        }
    })
    .to_string();

    let events = parse_server_events(&msg);
    assert_eq!(
        events,
        vec![
            ServerEvent::Text("Hello".to_string()),
            ServerEvent::Audio(vec![7, 8, 9]),
            ServerEvent::Text(" world".to_string()),
        ]
    );
}

#[test]
fn test_parse_turn_complete_is_last() {
    let msg = json!({
        "serverContent": {
            "modelTurn": { "parts": [{ "text": "done" }] },
            "turnComplete": true
        }
    })
    .to_string();

    let events = parse_server_events(&msg);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1], ServerEvent::TurnComplete);
}

#[test]
fn test_parse_generation_complete_ends_turn() {
    let msg = json!({
        "serverContent": { "generationComplete": true }
    })
    .to_string();

    assert_eq!(parse_server_events(&msg), vec![ServerEvent::TurnComplete]);
}

#[test]
fn test_parse_skips_whitespace_only_text() {
    let msg = json!({
        "serverContent": {
            "modelTurn": { "parts": [{ "text": "\n" }, { "text": " hi" }] }
        }
    })
    .to_string();

    assert_eq!(
        parse_server_events(&msg),
        vec![ServerEvent::Text(" hi".to_string())]
    );
}

#[test]
fn test_parse_ignores_unrelated_messages() {
    assert!(parse_server_events("{\"usageMetadata\":{}}").is_empty());
    assert!(parse_server_events("not json").is_empty());
}

#[test]
fn test_parse_error_extracts_message() {
    let msg = json!({
        "error": { "code": 400, "message": "API key not valid" }
    })
    .to_string();

    assert_eq!(parse_error(&msg), Some("API key not valid".to_string()));
    assert_eq!(parse_error("{\"serverContent\":{}}"), None);
}

#[test]
fn test_setup_complete_detection() {
    assert!(is_setup_complete("{\"setupComplete\":{}}"));
    assert!(!is_setup_complete("{\"serverContent\":{}}"));
}
