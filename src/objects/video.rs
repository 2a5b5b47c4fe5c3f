use super::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Queued,
    Downloading,
    Paused,
    Completed,
    Failed,
}

impl Default for DownloadStatus {
    fn default() -> Self {
        DownloadStatus::Queued
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "best")]
    Best,
    // the service spells it audio_only, older clients send bestaudio
    #[serde(rename = "audioonly", alias = "audio_only", alias = "bestaudio")]
    AudioOnly,
    #[serde(rename = "worst")]
    Worst,
}

impl Format {
    pub fn all() -> [Format; 3] {
        [Format::Best, Format::AudioOnly, Format::Worst]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Format::Best => "Best",
            Format::AudioOnly => "Audio Only",
            Format::Worst => "Worst",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Best => "best",
            Format::AudioOnly => "audioonly",
            Format::Worst => "worst",
        }
    }

    pub fn parse(val: &str) -> Option<Format> {
        match val {
            "best" => Some(Format::Best),
            "audioonly" | "audio_only" | "bestaudio" => Some(Format::AudioOnly),
            "worst" => Some(Format::Worst),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Scan,
    Download,
}

impl Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Scan => f.write_str("scan"),
            JobType::Download => f.write_str("download"),
        }
    }
}

/// A download job and its result, as the service stores it.
///
/// `id` is derived on the client from the source url and joins a video with
/// its progress telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub video_id: String,
    pub url: String,
    pub format: Format,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub download_status: DownloadStatus,
    pub audio_only: bool,
    pub watched: bool,
    pub downloaded: bool,
    pub prev_watch_time: f64,
    pub full_title: String,
    pub duration_string: String,
    pub size: String,
    pub resolution: String,
    pub video_path_id: String,
    pub thumbnail_path_id: String,
    pub vtt_path_id: String,
    pub vtt_sprite_path_id: String,
}

impl Video {
    /// The placeholder submitted on creation; descriptive fields stay empty
    /// until the service fills them in.
    pub fn provisional(id: String, url: String, format: Format, job_type: JobType) -> Self {
        Self {
            id,
            video_id: String::new(),
            url,
            format,
            job_type,
            download_status: DownloadStatus::Queued,
            audio_only: false,
            watched: false,
            downloaded: false,
            prev_watch_time: 0.0,
            full_title: String::new(),
            duration_string: String::new(),
            size: String::new(),
            resolution: String::new(),
            video_path_id: String::new(),
            thumbnail_path_id: String::new(),
            vtt_path_id: String::new(),
            vtt_sprite_path_id: String::new(),
        }
    }

    /// Structural validation of a payload received from the network.
    pub fn validate(value: Value) -> Result<Self, SchemaError> {
        let video: Video =
            serde_json::from_value(value).map_err(|e| SchemaError::new("video", e.to_string()))?;

        match video.id.is_empty() {
            true => Err(SchemaError::new("video", "empty id")),
            false => Ok(video),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.download_status == DownloadStatus::Completed
    }

    /// Case-insensitive match of `needle` against the searchable columns.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();

        if needle.is_empty() {
            return true;
        }

        [
            &self.id,
            &self.url,
            &self.full_title,
            &self.size,
            &self.resolution,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
