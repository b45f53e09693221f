use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Privileged contract account. The devnet ledger is seeded with it.
    pub insurer: String,
    /// Account the wallet starts on.
    pub holder: String,
    pub resolve_attempts: u32,
    pub resolve_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            insurer: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".into(),
            holder: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".into(),
            resolve_attempts: 20,
            resolve_delay_ms: 250,
        }
    }
}

impl Settings {
    pub fn resolve_delay(&self) -> Duration {
        Duration::from_millis(self.resolve_delay_ms)
    }
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).unwrap_or_default(),
        Err(_) => Settings::default(),
    };

    if let Ok(v) = std::env::var("CONSOLE_INSURER") {
        settings.insurer = v;
    }
    if let Ok(v) = std::env::var("CONSOLE_HOLDER") {
        settings.holder = v;
    }
    if let Ok(v) = std::env::var("CONSOLE_RESOLVE_ATTEMPTS") {
        if let Ok(parsed) = v.parse() {
            settings.resolve_attempts = parsed;
        }
    }
    if let Ok(v) = std::env::var("CONSOLE_RESOLVE_DELAY_MS") {
        if let Ok(parsed) = v.parse() {
            settings.resolve_delay_ms = parsed;
        }
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let settings: Settings = toml::from_str("insurer = \"0xABC\"").expect("parse");
        assert_eq!(settings.insurer, "0xABC");
        assert_eq!(settings.holder, Settings::default().holder);
        assert_eq!(settings.resolve_attempts, 20);
    }
}
