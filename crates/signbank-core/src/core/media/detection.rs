//! Media Tool Detection
//!
//! Locates ffmpeg/ffprobe on the host. Absence of either binary is a fatal
//! precondition for a pipeline run, checked once at startup before any
//! scanning happens.

use std::path::PathBuf;
use std::process::Command;

use super::{MediaError, MediaResult};
use crate::core::{PipelineError, PipelineResult};

/// Paths of a detected ffmpeg installation
#[derive(Debug, Clone)]
pub struct MediaToolPaths {
    /// Path to the transcoder binary
    pub ffmpeg_path: PathBuf,
    /// Path to the prober binary
    pub ffprobe_path: PathBuf,
    /// ffmpeg version string
    pub version: String,
}

/// Detects ffmpeg and ffprobe, checking common install locations first and
/// falling back to a PATH search.
pub fn detect_tools() -> MediaResult<MediaToolPaths> {
    detect_named("ffmpeg", "ffprobe")
}

/// Run precondition: both tools must be reachable before any scanning.
///
/// Absence surfaces as [`PipelineError::Precondition`], which is the only
/// error kind fatal to a whole run.
pub fn require_tools() -> PipelineResult<MediaToolPaths> {
    require_named("ffmpeg", "ffprobe")
}

fn require_named(ffmpeg: &str, ffprobe: &str) -> PipelineResult<MediaToolPaths> {
    detect_named(ffmpeg, ffprobe).map_err(PipelineError::from)
}

fn detect_named(ffmpeg: &str, ffprobe: &str) -> MediaResult<MediaToolPaths> {
    let ffmpeg_path = find_binary(ffmpeg)?;
    let ffprobe_path = find_binary(ffprobe)?;
    let version = tool_version(&ffmpeg_path)?;

    Ok(MediaToolPaths {
        ffmpeg_path,
        ffprobe_path,
        version,
    })
}

fn find_binary(name: &str) -> MediaResult<PathBuf> {
    #[cfg(target_os = "windows")]
    let binary_name = format!("{name}.exe");

    #[cfg(not(target_os = "windows"))]
    let binary_name = name.to_string();

    for dir in common_tool_dirs() {
        let candidate = dir.join(&binary_name);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    // Fall back to PATH search using `where` (Windows) or `which` (Unix)
    #[cfg(target_os = "windows")]
    let lookup = "where";

    #[cfg(not(target_os = "windows"))]
    let lookup = "which";

    let output = Command::new(lookup)
        .arg(name)
        .output()
        .map_err(|_| MediaError::NotFound)?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = path_str.lines().next() {
            return Ok(PathBuf::from(first_line.trim()));
        }
    }

    Err(MediaError::NotFound)
}

/// Common ffmpeg installation paths for the current platform
fn common_tool_dirs() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));

        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/opt/local/bin")); // MacPorts
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

fn tool_version(ffmpeg_path: &PathBuf) -> MediaResult<String> {
    let output = Command::new(ffmpeg_path)
        .arg("-version")
        .output()
        .map_err(MediaError::ProcessError)?;

    if !output.status.success() {
        return Err(MediaError::ExecutionFailed(
            "ffmpeg binary is not functional".to_string(),
        ));
    }

    let output_str = String::from_utf8_lossy(&output.stdout);

    // Parse version from first line: "ffmpeg version X.X.X ..."
    if let Some(first_line) = output_str.lines().next() {
        if let Some(version_part) = first_line.strip_prefix("ffmpeg version ") {
            if let Some(version) = version_part.split_whitespace().next() {
                return Ok(version.to_string());
            }
        }
        return Ok(first_line.to_string());
    }

    Err(MediaError::ParseError(
        "Could not parse ffmpeg version".to_string(),
    ))
}
