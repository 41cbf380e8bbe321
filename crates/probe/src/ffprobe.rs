use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ProbeError;

/// Technical metadata for one media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// ffprobe `format_name`, e.g. `matroska,webm`.
    pub format_name: String,
    /// Whole seconds, rounded half up.
    pub duration_secs: u32,
    pub video: Option<VideoStream>,
    pub audio: Vec<AudioStream>,
    pub subtitles: Vec<SubtitleStream>,
}

impl MediaInfo {
    /// The first audio stream, which describes the file as a whole.
    pub fn primary_audio(&self) -> Option<&AudioStream> {
        self.audio.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    pub index: u32,
    pub codec: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioStream {
    pub index: u32,
    pub codec: String,
    pub channels: u32,
    pub language: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStream {
    pub index: u32,
    pub codec: String,
    pub language: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub is_forced: bool,
    #[serde(default)]
    pub is_default: bool,
}

// ─── Raw ffprobe JSON ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawOutput {
    format: Option<RawFormat>,
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    #[serde(default)]
    format_name: Option<String>,
    // ffprobe prints numbers inside strings
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStream {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    codec_type: String,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    channels: Option<u32>,
    #[serde(default)]
    tags: RawTags,
    #[serde(default)]
    disposition: RawDisposition,
}

#[derive(Debug, Default, Deserialize)]
struct RawTags {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDisposition {
    #[serde(default)]
    default: u8,
    #[serde(default)]
    forced: u8,
}

/// Run ffprobe on a file and parse its JSON report.
pub async fn probe(ffprobe_path: &Path, file: &Path) -> Result<MediaInfo, ProbeError> {
    debug!(path = %file.display(), "probing media file");
    let output = tokio::process::Command::new(ffprobe_path)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(file)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::BinaryNotFound(ffprobe_path.to_path_buf())
            } else {
                ProbeError::Spawn(e)
            }
        })?;

    if !output.status.success() {
        return Err(ProbeError::Exit {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Turn ffprobe's `-print_format json` output into [`MediaInfo`].
pub fn parse_probe_output(stdout: &[u8]) -> Result<MediaInfo, ProbeError> {
    let raw: RawOutput =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::Malformed(e.to_string()))?;

    let format = raw
        .format
        .ok_or_else(|| ProbeError::Malformed("missing 'format'".into()))?;

    let duration_secs = format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| d.round() as u32)
        .unwrap_or(0);

    let mut info = MediaInfo {
        format_name: format.format_name.unwrap_or_else(|| "unknown".into()),
        duration_secs,
        ..MediaInfo::default()
    };

    for s in raw.streams {
        let codec = s.codec_name.unwrap_or_else(|| "unknown".into());
        let language = non_empty(s.tags.language);
        let title = non_empty(s.tags.title);
        let is_default = s.disposition.default == 1;

        match s.codec_type.as_str() {
            "video" => {
                // Cover art shows up as a second video stream; keep the first.
                if info.video.is_none() {
                    info.video = Some(VideoStream {
                        index: s.index,
                        codec,
                        width: s.width.unwrap_or(0),
                        height: s.height.unwrap_or(0),
                    });
                }
            }
            "audio" => info.audio.push(AudioStream {
                index: s.index,
                codec,
                channels: s.channels.unwrap_or(0),
                language,
                title,
                is_default,
            }),
            "subtitle" => info.subtitles.push(SubtitleStream {
                index: s.index,
                codec,
                language,
                title,
                is_forced: s.disposition.forced == 1,
                is_default,
            }),
            _ => {}
        }
    }

    Ok(info)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_probe_json() {
        let json = serde_json::json!({
            "format": {
                "format_name": "matroska,webm",
                "duration": "7200.523",
                "bit_rate": "5000000"
            },
            "streams": [
                {
                    "index": 0,
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "disposition": { "default": 1, "forced": 0 }
                },
                {
                    "index": 1,
                    "codec_type": "audio",
                    "codec_name": "aac",
                    "channels": 6,
                    "tags": { "language": "eng", "title": "Surround" },
                    "disposition": { "default": 1, "forced": 0 }
                },
                {
                    "index": 2,
                    "codec_type": "subtitle",
                    "codec_name": "subrip",
                    "tags": { "language": "eng" },
                    "disposition": { "default": 0, "forced": 0 }
                },
                {
                    "index": 3,
                    "codec_type": "subtitle",
                    "codec_name": "hdmv_pgs_subtitle",
                    "tags": { "language": "eng" },
                    "disposition": { "default": 0, "forced": 1 }
                },
                {
                    "index": 4,
                    "codec_type": "attachment",
                    "codec_name": "ttf"
                }
            ]
        });

        let info = parse_probe_output(json.to_string().as_bytes()).unwrap();
        assert_eq!(info.format_name, "matroska,webm");
        assert_eq!(info.duration_secs, 7201);

        let v = info.video.as_ref().unwrap();
        assert_eq!(v.codec, "h264");
        assert_eq!((v.width, v.height), (1920, 1080));

        let a = info.primary_audio().unwrap();
        assert_eq!(a.codec, "aac");
        assert_eq!(a.channels, 6);
        assert_eq!(a.language.as_deref(), Some("eng"));
        assert!(a.is_default);

        assert_eq!(info.subtitles.len(), 2);
        assert_eq!(info.subtitles[0].codec, "subrip");
        assert!(!info.subtitles[0].is_forced);
        assert_eq!(info.subtitles[1].index, 3);
        assert!(info.subtitles[1].is_forced);
    }

    #[test]
    fn audio_only_file_has_no_video() {
        let json = br#"{"format":{"format_name":"mp3","duration":"59.4"},
            "streams":[{"index":0,"codec_type":"audio","codec_name":"mp3","channels":2}]}"#;
        let info = parse_probe_output(json).unwrap();
        assert!(info.video.is_none());
        assert_eq!(info.duration_secs, 59);
        assert_eq!(info.audio.len(), 1);
    }

    #[test]
    fn missing_duration_defaults_to_zero() {
        let json = br#"{"format":{"format_name":"avi"},"streams":[]}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration_secs, 0);
        assert!(info.primary_audio().is_none());
    }

    #[test]
    fn blank_tags_become_none() {
        let json = br#"{"format":{"format_name":"mkv"},
            "streams":[{"index":2,"codec_type":"subtitle","codec_name":"ass",
                        "tags":{"language":"  ","title":""}}]}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.subtitles[0].language, None);
        assert_eq!(info.subtitles[0].title, None);
    }

    #[test]
    fn rejects_malformed_output() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ProbeError::Malformed(_))
        ));
        assert!(matches!(
            parse_probe_output(br#"{"streams":[]}"#),
            Err(ProbeError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let err = probe(
            Path::new("/nonexistent/bin/ffprobe-cinedex"),
            Path::new("/tmp/whatever.mkv"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProbeError::BinaryNotFound(_)));
    }
}
