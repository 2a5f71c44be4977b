use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use crate::media::MediaError;

/// Metadata needed to drive playback, extracted with ffprobe before the
/// decode stream is started.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub duration_us: i64,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProbeOutput {
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

/// Runs ffprobe on the file and parses its JSON output.
pub fn probe(path: &Path) -> Result<MediaInfo, MediaError> {
    let open_err = |reason: String| MediaError::Open {
        path: path.to_path_buf(),
        reason,
    };

    let path_str = path
        .to_str()
        .ok_or_else(|| open_err("path is not valid UTF-8".into()))?;

    let output = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format", "-show_streams",
            path_str,
        ])
        .output()
        .map_err(|e| open_err(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(open_err(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| open_err(format!("unreadable ffprobe output: {}", e)))?;

    media_info_from_probe(&parsed).map_err(|reason| open_err(reason))
}

pub(crate) fn media_info_from_probe(probe: &ProbeOutput) -> Result<MediaInfo, String> {
    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| "no video stream found".to_string())?;

    // Duration may legitimately be missing (e.g. raw streams); report 0 so
    // the position model knows not to compute indicator values.
    let duration_us = match probe.format.duration.as_deref() {
        Some(s) => {
            let seconds: f64 = s
                .parse()
                .map_err(|e| format!("bad duration {:?}: {}", s, e))?;
            (seconds * 1_000_000.0) as i64
        }
        None => 0,
    };

    let frame_rate = video_stream
        .r_frame_rate
        .as_deref()
        .map(parse_frame_rate)
        .transpose()?
        .unwrap_or(30.0);

    let width = video_stream.width.ok_or("video stream has no width")?;
    let height = video_stream.height.ok_or("video stream has no height")?;

    Ok(MediaInfo {
        duration_us,
        frame_rate,
        width,
        height,
    })
}

/// ffprobe reports frame rate as a ratio like "30/1" or "30000/1001".
pub(crate) fn parse_frame_rate(s: &str) -> Result<f64, String> {
    if let Some((num, den)) = s.split_once('/') {
        let numerator: f64 = num
            .parse()
            .map_err(|e| format!("bad frame rate {:?}: {}", s, e))?;
        let denominator: f64 = den
            .parse()
            .map_err(|e| format!("bad frame rate {:?}: {}", s, e))?;
        if denominator == 0.0 {
            return Err(format!("zero denominator in frame rate {:?}", s));
        }
        Ok(numerator / denominator)
    } else {
        s.parse()
            .map_err(|e| format!("bad frame rate {:?}: {}", s, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate_ratio() {
        assert_eq!(parse_frame_rate("30/1").unwrap(), 30.0);
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_frame_rate_plain() {
        assert_eq!(parse_frame_rate("25").unwrap(), 25.0);
    }

    #[test]
    fn test_parse_frame_rate_rejects_garbage() {
        assert!(parse_frame_rate("abc").is_err());
        assert!(parse_frame_rate("30/0").is_err());
    }

    #[test]
    fn test_media_info_from_probe_json() {
        let json = r#"{
            "format": { "duration": "10.000000" },
            "streams": [
                { "codec_type": "audio" },
                { "codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30/1" }
            ]
        }"#;
        let parsed: ProbeOutput = serde_json::from_str(json).unwrap();
        let info = media_info_from_probe(&parsed).unwrap();
        assert_eq!(info.duration_us, 10_000_000);
        assert_eq!(info.frame_rate, 30.0);
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
    }

    #[test]
    fn test_media_info_missing_duration_reports_zero() {
        let json = r#"{
            "format": {},
            "streams": [
                { "codec_type": "video", "width": 640, "height": 480, "r_frame_rate": "25/1" }
            ]
        }"#;
        let parsed: ProbeOutput = serde_json::from_str(json).unwrap();
        let info = media_info_from_probe(&parsed).unwrap();
        assert_eq!(info.duration_us, 0);
    }

    #[test]
    fn test_media_info_requires_video_stream() {
        let json = r#"{ "format": { "duration": "5.0" }, "streams": [ { "codec_type": "audio" } ] }"#;
        let parsed: ProbeOutput = serde_json::from_str(json).unwrap();
        assert!(media_info_from_probe(&parsed).is_err());
    }
}
