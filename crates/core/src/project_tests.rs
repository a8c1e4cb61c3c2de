// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn request(name: &str, url: &str) -> NewProject {
    NewProject { name: name.to_string(), url: url.to_string(), branch: None, path: None }
}

#[yare::parameterized(
    ok        = { "grove", "https://github.com/x/grove", true },
    no_name   = { "  ", "https://github.com/x/grove", false },
    no_url    = { "grove", "", false },
    traversal = { "../etc", "https://github.com/x/grove", false },
    slash     = { "a/b", "https://github.com/x/grove", false },
)]
fn validate(name: &str, url: &str, ok: bool) {
    assert_eq!(request(name, url).validate().is_ok(), ok);
}

#[test]
fn into_record_fills_defaults() {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let record = request(" grove ", "https://github.com/x/grove").into_record(3, at);
    assert_eq!(record.id, 3);
    assert_eq!(record.name, "grove");
    assert_eq!(record.branch, "main");
    assert_eq!(record.path, "projects/grove");
    assert!(record.enabled);
    assert_eq!(record.last_sync, None);
}
