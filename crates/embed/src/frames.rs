//! Frame sources and the one-frame-per-second sampling policy.
//!
//! Decoding is not done here. A [`VideoSource`] hands out already-decoded
//! frames as encoded image bytes, and [`sample_frames`] keeps the first frame
//! of every second.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::EmbedError;

/// File extensions [`DirectoryVideoSource`] treats as frames.
pub const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// One decoded frame, numbered from zero in decode order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub index: u64,
    pub bytes: Bytes,
}

/// A frame kept by [`sample_frames`], labelled `frame_<index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledImage {
    pub frame_id: String,
    pub bytes: Bytes,
}

/// Sequential reader over the decoded frames of one video.
#[async_trait]
pub trait FrameSource: Send {
    fn frames_per_second(&self) -> f64;

    /// Next frame in decode order, `None` once the video is exhausted.
    async fn next_frame(&mut self) -> Result<Option<Frame>, EmbedError>;
}

/// Opens videos by reference (a URL, a path, or any key the source understands).
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn open(&self, video_ref: &str) -> Result<Box<dyn FrameSource>, EmbedError>;
}

/// Decoded frames between two samples: the integer part of `fps`.
pub fn sampling_interval(fps: f64) -> Result<u64, EmbedError> {
    if !fps.is_finite() || fps < 1.0 {
        return Err(EmbedError::InvalidFps(fps));
    }
    Ok(fps.trunc() as u64)
}

pub fn frame_id(index: u64) -> String {
    format!("frame_{index}")
}

/// Drain `source`, keeping every frame whose index is a multiple of the
/// sampling interval.
pub async fn sample_frames(source: &mut dyn FrameSource) -> Result<Vec<SampledImage>, EmbedError> {
    let interval = sampling_interval(source.frames_per_second())?;
    let mut sampled = Vec::new();
    while let Some(frame) = source.next_frame().await? {
        if frame.index % interval == 0 {
            sampled.push(SampledImage {
                frame_id: frame_id(frame.index),
                bytes: frame.bytes,
            });
        }
    }
    tracing::debug!(interval, sampled = sampled.len(), "sampled frames");
    Ok(sampled)
}

#[derive(Debug, Clone)]
struct StoredVideo {
    fps: f64,
    frames: Vec<Bytes>,
}

/// Videos held in memory, keyed by reference. Used by tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryVideoSource {
    videos: RwLock<HashMap<String, StoredVideo>>,
}

impl InMemoryVideoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a video.
    pub fn insert<I, B>(&self, video_ref: impl Into<String>, fps: f64, frames: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let video = StoredVideo {
            fps,
            frames: frames.into_iter().map(Into::into).collect(),
        };
        let mut guard = self
            .videos
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert(video_ref.into(), video);
    }

    pub fn len(&self) -> usize {
        self.videos
            .read()
            .map(|guard| guard.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VideoSource for InMemoryVideoSource {
    async fn open(&self, video_ref: &str) -> Result<Box<dyn FrameSource>, EmbedError> {
        let guard = self
            .videos
            .read()
            .map_err(|_| EmbedError::Transient("poisoned lock".into()))?;
        let video = guard
            .get(video_ref)
            .cloned()
            .ok_or_else(|| EmbedError::VideoNotFound(video_ref.to_string()))?;
        Ok(Box::new(VecFrameSource {
            fps: video.fps,
            frames: video.frames.into_iter().enumerate().collect::<Vec<_>>().into_iter(),
        }))
    }
}

struct VecFrameSource {
    fps: f64,
    frames: std::vec::IntoIter<(usize, Bytes)>,
}

#[async_trait]
impl FrameSource for VecFrameSource {
    fn frames_per_second(&self) -> f64 {
        self.fps
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, EmbedError> {
        Ok(self.frames.next().map(|(index, bytes)| Frame {
            index: index as u64,
            bytes,
        }))
    }
}

/// A video is a directory of decoded frame images; frames are read in file
/// name order at a fixed frame rate.
///
/// Relative references resolve against `root`.
#[derive(Debug, Clone)]
pub struct DirectoryVideoSource {
    root: PathBuf,
    fps: f64,
}

impl DirectoryVideoSource {
    pub fn new(root: impl Into<PathBuf>, fps: f64) -> Self {
        Self {
            root: root.into(),
            fps,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    fn resolve(&self, video_ref: &str) -> PathBuf {
        let path = Path::new(video_ref);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            FRAME_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[async_trait]
impl VideoSource for DirectoryVideoSource {
    async fn open(&self, video_ref: &str) -> Result<Box<dyn FrameSource>, EmbedError> {
        let dir = self.resolve(video_ref);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(EmbedError::VideoNotFound(video_ref.to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_frame_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        tracing::debug!(dir = %dir.display(), frames = paths.len(), "opened frame directory");

        Ok(Box::new(DirectoryFrameSource {
            fps: self.fps,
            paths: paths.into_iter(),
            next_index: 0,
        }))
    }
}

struct DirectoryFrameSource {
    fps: f64,
    paths: std::vec::IntoIter<PathBuf>,
    next_index: u64,
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    fn frames_per_second(&self) -> f64 {
        self.fps
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, EmbedError> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        let bytes = tokio::fs::read(&path).await?;
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(Frame {
            index,
            bytes: Bytes::from(bytes),
        }))
    }
}
