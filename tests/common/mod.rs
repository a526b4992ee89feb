#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write a chat export document with the given message objects.
pub fn write_export(dir: &Path, name: &str, messages: &[&str]) -> PathBuf {
    let body = format!(
        r#"{{
  "guild": {{"id": "900", "name": "Test Guild", "iconUrl": "https://example.invalid/icon.png"}},
  "channel": {{"id": "901", "type": "GuildTextChat", "category": "General", "name": "general", "topic": null}},
  "dateRange": {{"after": null, "before": null}},
  "exportedAt": "2024-05-01T12:00:00+00:00",
  "messages": [
    {}
  ],
  "messageCount": {}
}}"#,
        messages.join(",\n    "),
        messages.len()
    );
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

/// A message object with the given author id, name and roles.
pub fn message(id: &str, name: &str, roles: &[(&str, &str)]) -> String {
    let roles: Vec<String> = roles
        .iter()
        .map(|(id, name)| format!(r#"{{"id": "{}", "name": "{}", "color": null, "position": 1}}"#, id, name))
        .collect();
    format!(
        r#"{{"id": "m-{id}", "type": "Default", "content": "hi", "author": {{"id": "{id}", "name": "{name}", "discriminator": "0000", "nickname": "", "isBot": false, "roles": [{}]}}, "attachments": []}}"#,
        roles.join(", ")
    )
}

/// Parse a report into sorted rows (header excluded).
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        vec!["UserID", "Username", "DisplayName", "RoleID", "RoleName"]
    );
    let mut rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    rows.sort();
    rows
}

pub fn arg(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

pub fn row(fields: [&str; 5]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}
