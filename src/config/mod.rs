//! Configuration management for Vidmark.

mod settings;

pub use settings::{
    AudioSettings, DownloadSettings, FrameSettings, GeneralSettings, RefineSettings, Settings,
    WhisperSettings,
};
