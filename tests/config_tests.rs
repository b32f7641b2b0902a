// Configuration loading tests.

use glance::Config;

#[test]
fn test_defaults_without_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glance");

    let cfg = Config::load(path.to_str().unwrap()).unwrap();

    assert_eq!(cfg.live.model, "models/gemini-2.0-flash-exp");
    assert_eq!(cfg.live.voice, "Puck");
    assert!(cfg.live.google_search);
    assert_eq!(cfg.audio.send_sample_rate, 16000);
    assert_eq!(cfg.audio.receive_sample_rate, 24000);
    assert_eq!(cfg.audio.chunk_frames, 1024);
    assert_eq!(cfg.capture.camera_interval_ms, 200);
    assert_eq!(cfg.capture.screen_interval_ms, 1000);
    assert_eq!(cfg.capture.max_frame_px, 512);
}

#[test]
fn test_file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("glance.toml");
    std::fs::write(
        &file,
        r#"
[live]
model = "models/gemini-2.0-pro"
voice = "Kore"
api_key = "file-key"

[capture]
screen_interval_ms = 2000
"#,
    )
    .unwrap();

    let path = dir.path().join("glance");
    let cfg = Config::load(path.to_str().unwrap()).unwrap();

    assert_eq!(cfg.live.model, "models/gemini-2.0-pro");
    assert_eq!(cfg.live.voice, "Kore");
    assert_eq!(cfg.live.api_key.as_deref(), Some("file-key"));
    assert_eq!(cfg.capture.screen_interval_ms, 2000);

    // Sections and keys not in the file keep their defaults.
    assert!(cfg.live.google_search);
    assert_eq!(cfg.capture.camera_interval_ms, 200);
    assert_eq!(cfg.audio.send_sample_rate, 16000);
}
