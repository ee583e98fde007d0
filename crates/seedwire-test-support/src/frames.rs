//! Parsed view over outbound JSON frames.

use serde_json::Value;

/// Ordered outbound frames decoded as JSON.
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    frames: Vec<Value>,
}

impl FrameLog {
    /// Decode raw text frames.
    ///
    /// # Panics
    ///
    /// Panics if a frame is not valid JSON.
    #[must_use]
    pub fn parse(frames: Vec<String>) -> Self {
        let frames = frames
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("frame is JSON"))
            .collect();
        Self { frames }
    }

    /// `type` discriminator of every frame, in order.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.frames
            .iter()
            .map(|frame| frame["type"].as_str().unwrap_or_default())
            .collect()
    }

    /// First frame of `kind`.
    #[must_use]
    pub fn first(&self, kind: &str) -> Option<&Value> {
        self.frames.iter().find(|frame| frame["type"] == kind)
    }

    /// Number of frames of `kind`.
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame["type"] == kind)
            .count()
    }

    /// Index of the first frame of `kind`.
    #[must_use]
    pub fn position(&self, kind: &str) -> Option<usize> {
        self.frames.iter().position(|frame| frame["type"] == kind)
    }

    /// Frames describing the worker with `hash`.
    #[must_use]
    pub fn for_hash(&self, hash: &str) -> Self {
        Self {
            frames: self
                .frames
                .iter()
                .filter(|frame| frame["hash"] == hash)
                .cloned()
                .collect(),
        }
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frames were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
