//! `journey sound`: show or change the sound preference.

use std::io::Write;
use std::path::Path;

use clap::{Args, ValueEnum};
use journey_core::config::ProjectConfig;
use journey_core::{Change, ProgressStore};
use journey_core::storage::Storage;
use serde::Serialize;

use crate::output::{OutputMode, render_mode};
use crate::project::{change_label, ensure_saved, open_progress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SoundSetting {
    On,
    Off,
    #[default]
    Toggle,
}

#[derive(Args, Debug, Default)]
pub struct SoundArgs {
    /// `on`, `off` or `toggle`.
    #[arg(value_enum, default_value_t = SoundSetting::Toggle)]
    pub setting: SoundSetting,
}

#[derive(Debug, Serialize)]
struct SoundOutput {
    sound_enabled: bool,
    change: &'static str,
}

/// Bring the preference to `setting`, flipping at most once.
pub fn apply_setting<S: Storage>(store: &mut ProgressStore<S>, setting: SoundSetting) -> Change {
    let wanted = match setting {
        SoundSetting::On => true,
        SoundSetting::Off => false,
        SoundSetting::Toggle => !store.sound_enabled(),
    };
    if wanted == store.sound_enabled() {
        Change::Unchanged
    } else {
        store.toggle_sound()
    }
}

pub fn run_sound(
    args: &SoundArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut store = open_progress(project_root, config, output)?;
    let change = apply_setting(&mut store, args.setting);
    ensure_saved(output, store.last_persist_error())?;

    let payload = SoundOutput {
        sound_enabled: store.sound_enabled(),
        change: change_label(change),
    };
    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "sound={}", if p.sound_enabled { "on" } else { "off" }),
        |p, w| writeln!(w, "Sound is {}.", if p.sound_enabled { "on" } else { "off" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use journey_core::storage::MemoryStorage;

    #[test]
    fn explicit_settings_are_idempotent() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        assert_eq!(apply_setting(&mut store, SoundSetting::On), Change::Applied);
        assert_eq!(apply_setting(&mut store, SoundSetting::On), Change::Unchanged);
        assert!(store.sound_enabled());
        assert_eq!(apply_setting(&mut store, SoundSetting::Toggle), Change::Applied);
        assert!(!store.sound_enabled());
        assert_eq!(apply_setting(&mut store, SoundSetting::Off), Change::Unchanged);
    }
}
