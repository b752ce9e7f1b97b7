//! User settings
//!
//! Wallpaper/accent/volume/brightness, persisted as their own blob.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub wallpaper: String,
    pub accent: String,
    pub volume: u8,
    pub brightness: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wallpaper: "aurora".to_string(),
            accent: "frost".to_string(),
            volume: 60,
            brightness: 80,
        }
    }
}
