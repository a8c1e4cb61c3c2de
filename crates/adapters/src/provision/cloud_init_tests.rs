// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn render(webhook_url: &str, secret: &str) -> String {
    let session_id = SessionId::new("20260115-120000-abcdef");
    CloudInit { session_id: &session_id, webhook_url, webhook_secret: secret, idle_timeout_secs: 900 }
        .render()
}

#[test]
fn renders_instance_settings() {
    let rendered = render("https://bloom.example.com", "s3cret");
    assert!(rendered.starts_with("#cloud-config\n"));
    assert!(rendered.contains("SESSION_ID=20260115-120000-abcdef"));
    assert!(rendered.contains("IDLE_TIMEOUT=900"));
    assert!(rendered.contains("WEBHOOK_SECRET=s3cret"));
    assert!(rendered.contains(r#"curl -X POST "https://bloom.example.com/webhook/ready""#));
    assert!(!rendered.contains('@'));
}

#[test]
fn trailing_slash_is_dropped_from_webhook_url() {
    let rendered = render("https://bloom.example.com/", "s");
    assert!(rendered.contains("WEBHOOK_URL=https://bloom.example.com\n"));
}

#[test]
fn control_characters_cannot_inject_lines() {
    let rendered = render("https://bloom.example.com", "abc\nEVIL=1");
    assert!(rendered.contains("WEBHOOK_SECRET=abcEVIL=1"));
    assert!(!rendered.lines().any(|l| l.trim() == "EVIL=1"));
}
