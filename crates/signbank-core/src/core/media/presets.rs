//! Quality Presets
//!
//! Fixed target resolution/bitrate combinations for transcoding. The preset
//! name is also the filename suffix of the produced variant
//! (`<LABEL>_<preset>.mp4`).

use serde::Serialize;

/// One transcode target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityPreset {
    /// Preset label (e.g. "720p"); used as the variants key in the index
    pub name: &'static str,
    /// Output width
    pub width: u32,
    /// Output height
    pub height: u32,
    /// CRF value for x264 quality-based encoding
    pub crf: u8,
    /// Video bitrate cap (e.g. "2M")
    pub video_bitrate: &'static str,
    /// Audio bitrate (e.g. "128k")
    pub audio_bitrate: &'static str,
}

impl QualityPreset {
    /// 1280x720, the primary preset unless configured otherwise
    pub fn p720() -> Self {
        Self {
            name: "720p",
            width: 1280,
            height: 720,
            crf: 23,
            video_bitrate: "2M",
            audio_bitrate: "128k",
        }
    }

    /// 854x480
    pub fn p480() -> Self {
        Self {
            name: "480p",
            width: 854,
            height: 480,
            crf: 26,
            video_bitrate: "1M",
            audio_bitrate: "96k",
        }
    }

    /// 640x360, smallest variant for constrained playback
    pub fn p360() -> Self {
        Self {
            name: "360p",
            width: 640,
            height: 360,
            crf: 28,
            video_bitrate: "600k",
            audio_bitrate: "64k",
        }
    }

    /// All known presets, highest quality first.
    pub fn all() -> Vec<QualityPreset> {
        vec![Self::p720(), Self::p480(), Self::p360()]
    }

    /// Looks a preset up by its label.
    pub fn by_name(name: &str) -> Option<QualityPreset> {
        Self::all().into_iter().find(|p| p.name == name)
    }
}

impl Default for QualityPreset {
    fn default() -> Self {
        Self::p720()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset() {
        let preset = QualityPreset::default();
        assert_eq!(preset.name, "720p");
        assert_eq!(preset.width, 1280);
        assert_eq!(preset.height, 720);
    }

    #[test]
    fn test_by_name() {
        let preset = QualityPreset::by_name("480p").unwrap();
        assert_eq!(preset.width, 854);
        assert!(QualityPreset::by_name("1080p").is_none());
    }

    #[test]
    fn test_all_presets_have_unique_names() {
        let presets = QualityPreset::all();
        let mut names: Vec<&str> = presets.iter().map(|p| p.name).collect();
        names.dedup();
        assert_eq!(names.len(), presets.len());
    }
}
