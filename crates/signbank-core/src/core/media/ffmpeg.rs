//! FFmpeg Adapter
//!
//! Real-process implementation of [`MediaTools`] backed by ffmpeg/ffprobe.
//! Every invocation runs under a timeout; a timed-out tool call is treated
//! exactly like a failed one.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use super::{MediaError, MediaResult, MediaToolPaths, MediaTools, ProbeReport, QualityPreset};

/// Executes probe/thumbnail/transcode via the detected ffmpeg binaries
#[derive(Clone)]
pub struct FfmpegTools {
    paths: Arc<MediaToolPaths>,
    tool_timeout: Duration,
}

impl FfmpegTools {
    /// Creates an adapter from detected binaries.
    pub fn new(paths: MediaToolPaths, tool_timeout: Duration) -> Self {
        Self {
            paths: Arc::new(paths),
            tool_timeout,
        }
    }

    /// Detected tool paths.
    pub fn paths(&self) -> &MediaToolPaths {
        &self.paths
    }

    async fn run_tool(
        &self,
        program: &Path,
        args: &[String],
        context: &str,
    ) -> MediaResult<Vec<u8>> {
        let invocation = tokio::process::Command::new(program).args(args).output();

        let output = timeout(self.tool_timeout, invocation)
            .await
            .map_err(|_| MediaError::Timeout)?
            .map_err(MediaError::ProcessError)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::ExecutionFailed(format!(
                "{context}: {}",
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }

    fn ensure_parent_dir(output: &Path) -> MediaResult<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MediaError::OutputError(format!("Failed to create output directory: {e}"))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaTools for FfmpegTools {
    async fn probe(&self, input: &Path) -> MediaResult<ProbeReport> {
        if !input.exists() {
            return Err(MediaError::InvalidInput(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            input.to_string_lossy().to_string(),
        ];

        let stdout = self
            .run_tool(&self.paths.ffprobe_path, &args, "ffprobe failed")
            .await?;

        parse_probe_output(&String::from_utf8_lossy(&stdout))
    }

    async fn thumbnail(&self, input: &Path, offset_secs: f64, output: &Path) -> MediaResult<()> {
        if !input.exists() {
            return Err(MediaError::InvalidInput(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }
        Self::ensure_parent_dir(output)?;

        // -ss before -i for fast seeking; -q:v 2 for good JPEG quality
        let args = vec![
            "-ss".to_string(),
            format!("{offset_secs:.3}"),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ];

        self.run_tool(&self.paths.ffmpeg_path, &args, "Thumbnail extraction failed")
            .await?;
        Ok(())
    }

    async fn transcode(
        &self,
        input: &Path,
        preset: &QualityPreset,
        output: &Path,
    ) -> MediaResult<()> {
        if !input.exists() {
            return Err(MediaError::InvalidInput(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }
        Self::ensure_parent_dir(output)?;

        // Scale preserving aspect ratio, then pad to the exact target
        // resolution. faststart moves the moov atom so playback can begin
        // before the whole file downloads.
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
            w = preset.width,
            h = preset.height,
        );

        let args = vec![
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vf".to_string(),
            filter,
            "-c:v".to_string(),
            "libx264".to_string(),
            "-crf".to_string(),
            preset.crf.to_string(),
            "-b:v".to_string(),
            preset.video_bitrate.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            preset.audio_bitrate.to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ];

        self.run_tool(&self.paths.ffmpeg_path, &args, "Transcode failed")
            .await?;
        Ok(())
    }
}

/// Parses ffprobe JSON output into a [`ProbeReport`].
fn parse_probe_output(json_str: &str) -> MediaResult<ProbeReport> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| MediaError::ParseError(format!("Failed to parse ffprobe output: {e}")))?;

    let duration_secs = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .cloned()
        .unwrap_or_default();

    let video = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(|c| c.as_str()) == Some("video"))
        .ok_or_else(|| MediaError::ProbeError("No video stream found".to_string()))?;

    let width = video.get("width").and_then(|w| w.as_u64()).unwrap_or(0) as u32;
    let height = video.get("height").and_then(|h| h.as_u64()).unwrap_or(0) as u32;

    let frame_rate = video
        .get("r_frame_rate")
        .and_then(|f| f.as_str())
        .map(parse_frame_rate)
        .unwrap_or(30);

    let codec = video
        .get("codec_name")
        .and_then(|c| c.as_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(ProbeReport {
        duration_secs,
        width,
        height,
        frame_rate,
        codec,
    })
}

/// Parses a rational frame rate string (e.g. "30/1", "30000/1001") and
/// rounds to the nearest integer. Malformed input defaults to 30.
fn parse_frame_rate(raw: &str) -> u32 {
    let parts: Vec<&str> = raw.split('/').collect();
    let fps = if parts.len() == 2 {
        match (parts[0].parse::<f64>(), parts[1].parse::<f64>()) {
            (Ok(num), Ok(den)) if den > 0.0 => Some(num / den),
            _ => None,
        }
    } else {
        raw.parse::<f64>().ok()
    };

    match fps {
        Some(f) if f.is_finite() && f > 0.0 => f.round() as u32,
        _ => 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output_video() {
        let json = r#"{
            "format": {
                "duration": "10.5",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30/1"
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac",
                    "sample_rate": "48000",
                    "channels": 2
                }
            ]
        }"#;

        let report = parse_probe_output(json).unwrap();
        assert_eq!(report.duration_secs, 10.5);
        assert_eq!(report.width, 1920);
        assert_eq!(report.height, 1080);
        assert_eq!(report.frame_rate, 30);
        assert_eq!(report.codec, "h264");
        assert_eq!(report.resolution(), "1920x1080");
    }

    #[test]
    fn test_parse_probe_output_no_video_stream() {
        let json = r#"{
            "format": {"duration": "3.0"},
            "streams": [{"codec_type": "audio", "codec_name": "aac"}]
        }"#;
        assert!(parse_probe_output(json).is_err());
    }

    #[test]
    fn test_parse_probe_output_garbage() {
        assert!(parse_probe_output("not json").is_err());
    }

    #[test]
    fn test_parse_frame_rate_rational() {
        assert_eq!(parse_frame_rate("30/1"), 30);
        // 30000/1001 ≈ 29.97, rounds to 30
        assert_eq!(parse_frame_rate("30000/1001"), 30);
        assert_eq!(parse_frame_rate("25/1"), 25);
        assert_eq!(parse_frame_rate("24000/1001"), 24);
    }

    #[test]
    fn test_parse_frame_rate_malformed_defaults_to_30() {
        assert_eq!(parse_frame_rate(""), 30);
        assert_eq!(parse_frame_rate("abc"), 30);
        assert_eq!(parse_frame_rate("30/0"), 30);
        assert_eq!(parse_frame_rate("1/2/3"), 30);
    }

    #[test]
    fn test_parse_frame_rate_plain_number() {
        assert_eq!(parse_frame_rate("60"), 60);
        assert_eq!(parse_frame_rate("29.97"), 30);
    }
}
