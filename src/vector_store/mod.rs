//! Flat L2 vector index with parallel frame metadata.
//!
//! The index is append-only: record ids equal insertion order, and the
//! metadata store always holds exactly one entry per vector.

mod flat;

pub use flat::FlatVectorStore;

use serde::{Deserialize, Serialize};

/// Metadata describing one indexed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    /// Path of the source video file.
    pub source_path: String,
    /// Position of the frame in the source video (seconds).
    pub timestamp: f64,
    /// Generated natural-language description of the frame.
    pub description: String,
}

impl FrameMetadata {
    /// Format the frame timestamp for display.
    pub fn format_timestamp(&self) -> String {
        let total_seconds = self.timestamp as u32;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

/// A search result with its distance from the query.
///
/// Transient: produced fresh per query, never stored.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Record id (insertion order).
    pub id: usize,
    /// Squared Euclidean distance to the query (lower is better).
    pub distance: f32,
    /// The matched frame's metadata.
    pub metadata: FrameMetadata,
}

/// Summary information about an indexed source video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// Path of the source video file.
    pub source_path: String,
    /// Number of indexed frames.
    pub frame_count: usize,
    /// Timestamp of the last indexed frame (seconds).
    pub last_timestamp: f64,
}

/// Compute the squared Euclidean distance between two vectors.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(squared_l2(&a, &b).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((squared_l2(&a, &c) - 2.0).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((squared_l2(&a, &d) - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_frame_timestamp_format() {
        let meta = FrameMetadata {
            source_path: "a.mp4".to_string(),
            timestamp: 125.0, // 2:05
            description: "a frame".to_string(),
        };

        assert_eq!(meta.format_timestamp(), "02:05");

        let long = FrameMetadata {
            timestamp: 3725.0, // 1:02:05
            ..meta
        };
        assert_eq!(long.format_timestamp(), "01:02:05");
    }
}
