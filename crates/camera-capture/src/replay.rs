//! Image-sequence replay source
//!
//! Plays back a directory of still images as if they came from a webcam.
//! Files are ordered by name, so `frame_0001.png`, `frame_0002.png`, ...
//! replay in capture order.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{CameraError, FrameSource, VideoFrame};

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays still images from a directory
pub struct ImageSequenceSource {
    frames: Vec<PathBuf>,
    cursor: usize,
    sequence: u32,
    looping: bool,
    released: bool,
    opened_at: Instant,
}

impl ImageSequenceSource {
    /// Open a frame directory.
    ///
    /// With `looping` set, the sequence restarts after the last frame
    /// instead of reporting the device as exhausted.
    pub fn open(dir: impl AsRef<Path>, looping: bool) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CameraError::NotFound(dir.to_path_buf()));
        }

        let entries = std::fs::read_dir(dir).map_err(|e| CameraError::Open(e.to_string()))?;
        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_supported(path))
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(CameraError::Empty(dir.to_path_buf()));
        }

        info!("Opened replay source {} ({} frames)", dir.display(), frames.len());

        Ok(Self {
            frames,
            cursor: 0,
            sequence: 0,
            looping,
            released: false,
            opened_at: Instant::now(),
        })
    }

    /// Number of images in the sequence
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn next_path(&mut self) -> Option<PathBuf> {
        if self.cursor >= self.frames.len() {
            if !self.looping {
                return None;
            }
            debug!("Replay source wrapped around");
            self.cursor = 0;
        }
        let path = self.frames.get(self.cursor).cloned();
        self.cursor += 1;
        path
    }
}

impl FrameSource for ImageSequenceSource {
    fn capture(&mut self) -> Option<VideoFrame> {
        if self.released {
            return None;
        }

        let path = self.next_path()?;
        let img = match image::open(&path) {
            Ok(img) => img,
            Err(e) => {
                let err = CameraError::Decode {
                    path,
                    reason: e.to_string(),
                };
                warn!("{}", err);
                return None;
            }
        };

        let timestamp_ns = self.opened_at.elapsed().as_nanos() as u64;
        let frame = VideoFrame::from_image(&img, timestamp_ns, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        Some(frame)
    }

    fn release(&mut self) {
        if !self.released {
            debug!("Replay source released after {} frames", self.sequence);
        }
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
