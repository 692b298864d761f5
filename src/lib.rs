pub mod config_trigger;
pub mod engine;
pub mod host;
pub mod layout;
pub mod melody;
pub mod notes;
pub mod reminder;
pub mod replay;
pub mod session;
pub mod settings;
pub mod songs;
pub mod sound;
pub mod touch;

pub mod synth;

#[cfg(feature = "synth")]
pub mod output_synth;

#[cfg(feature = "midi")]
pub mod output_midir;

#[cfg(all(target_os = "android", feature = "android"))]
pub mod android_jni;
