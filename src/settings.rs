use crate::songs;
use crate::sound;
use crate::synth::clamp_a4_tuning;

/// User preferences that survive restarts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Sound set name, without the `soundset_` prefix.
    pub sound_set: String,
    pub melodies_enabled: bool,
    /// Melody ids, in the order they were picked.
    pub selected_melodies: Vec<String>,
    /// Synth tuning reference (A4) in Hz.
    pub a4_tuning_hz: u16,
}

impl Default for Settings {
    fn default() -> Self {
        let sound_set = if cfg!(feature = "synth") {
            sound::SYNTH
        } else {
            sound::SILENT
        };
        Self {
            sound_set: sound_set.to_string(),
            melodies_enabled: false,
            selected_melodies: songs::ids().map(str::to_string).collect(),
            a4_tuning_hz: 440,
        }
    }
}

impl Settings {
    pub fn encode(&self) -> String {
        format!(
            "sound_set={}\nmelodies_enabled={}\nselected_melodies={}\na4_tuning_hz={}\n",
            sound::strip_prefix(&self.sound_set),
            self.melodies_enabled,
            self.selected_melodies.join(","),
            self.a4_tuning_hz
        )
    }

    /// Reads what [`Settings::encode`] writes. Unknown keys and broken lines are skipped;
    /// anything missing keeps its default.
    pub fn decode(input: &str) -> Self {
        let mut s = Settings::default();

        for line in input.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((k, v)) = line.split_once('=') else { continue };
            let v = v.trim();
            match k.trim() {
                "sound_set" => {
                    let name = sound::strip_prefix(v);
                    if !name.is_empty() {
                        s.sound_set = name.to_string();
                    }
                }
                "melodies_enabled" => s.melodies_enabled = v == "true",
                "selected_melodies" => {
                    s.selected_melodies = v
                        .split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "a4_tuning_hz" => {
                    if let Ok(hz) = v.parse::<u16>() {
                        s.a4_tuning_hz = clamp_a4_tuning(hz);
                    }
                }
                other => log::debug!("Ignoring unknown setting '{other}'"),
            }
        }

        s
    }
}

#[cfg(feature = "desktop")]
pub fn desktop_settings_path() -> Option<std::path::PathBuf> {
    use std::path::PathBuf;

    #[cfg(windows)]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("pianoli").join("settings.txt"));
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("pianoli").join("settings.txt"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("pianoli").join("settings.txt"));
    }

    None
}

#[cfg(feature = "desktop")]
pub fn load_desktop_settings() -> Settings {
    let Some(path) = desktop_settings_path() else {
        return Settings::default();
    };

    match std::fs::read_to_string(&path) {
        Ok(s) => {
            log::debug!("Loaded settings from {}", path.display());
            Settings::decode(&s)
        }
        Err(_) => Settings::default(),
    }
}

#[cfg(feature = "desktop")]
pub fn save_desktop_settings(s: &Settings) -> std::io::Result<()> {
    let Some(path) = desktop_settings_path() else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, s.encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert!(!s.melodies_enabled);
        assert_eq!(s.selected_melodies.len(), songs::CATALOG.len());
        assert_eq!(s.a4_tuning_hz, 440);
        assert!(sound::available_sound_sets().contains(&s.sound_set.as_str()));
    }

    #[test]
    fn encode_then_decode_keeps_everything() {
        let s = Settings {
            sound_set: "midi".into(),
            melodies_enabled: true,
            selected_melodies: vec!["teapot".into(), "twinkle".into()],
            a4_tuning_hz: 432,
        };
        assert_eq!(Settings::decode(&s.encode()), s);
    }

    #[test]
    fn prefixed_names_are_stored_bare() {
        let s = Settings {
            sound_set: "soundset_synth".into(),
            ..Settings::default()
        };
        assert!(s.encode().starts_with("sound_set=synth\n"));
        assert_eq!(Settings::decode("sound_set=soundset_midi").sound_set, "midi");
    }

    #[test]
    fn junk_is_ignored() {
        let s = Settings::decode(
            "# comment\nnonsense\nvolume=11\n a4_tuning_hz = 445 \nmelodies_enabled=yes\nsound_set=\n",
        );
        assert_eq!(s.a4_tuning_hz, 445);
        assert!(!s.melodies_enabled);
        assert_eq!(s.sound_set, Settings::default().sound_set);
    }

    #[test]
    fn tuning_is_clamped() {
        assert_eq!(Settings::decode("a4_tuning_hz=100").a4_tuning_hz, 430);
        assert_eq!(Settings::decode("a4_tuning_hz=9000").a4_tuning_hz, 450);
        assert_eq!(Settings::decode("a4_tuning_hz=-3").a4_tuning_hz, 440);
    }

    #[test]
    fn empty_melody_list_survives() {
        let s = Settings::decode("selected_melodies=\n");
        assert!(s.selected_melodies.is_empty());
        let s = Settings::decode("selected_melodies= twinkle , ,teapot");
        assert_eq!(s.selected_melodies, vec!["twinkle", "teapot"]);
    }
}
