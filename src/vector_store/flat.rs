//! Flat-scan vector store implementation.
//!
//! Exhaustive squared-L2 scan over all stored vectors. Simple and exact;
//! fine for the frame counts a single video library produces.

use super::{squared_l2, FrameMetadata, IndexedSource, SearchHit};
use crate::error::{BlikkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// On-disk shape of the vector index file.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    dimensions: usize,
    metric: String,
    vectors: Vec<Vec<f32>>,
}

/// Distance metric marker written into the index file.
const METRIC_L2: &str = "l2";

#[derive(Debug, Default)]
struct Inner {
    vectors: Vec<Vec<f32>>,
    metadata: Vec<FrameMetadata>,
}

/// Append-only flat vector index with parallel metadata.
///
/// Record ids are assigned sequentially from 0 in insertion order; the
/// metadata entry for id `n` is always the metadata passed with the nth
/// `add_record` call. Records are never updated or deleted.
pub struct FlatVectorStore {
    dimensions: usize,
    inner: RwLock<Inner>,
}

impl FlatVectorStore {
    /// Create an empty store for vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Open the on-disk index/metadata pair, or start fresh if absent.
    ///
    /// Missing or malformed on-disk state is treated as "no prior data",
    /// not a fatal error. A stored index whose dimensionality differs from
    /// `dimensions`, or whose metadata count diverges from its vector count,
    /// is discarded the same way.
    pub fn open(index_path: &Path, metadata_path: &Path, dimensions: usize) -> Result<Self> {
        let store = Self::new(dimensions);

        let index: IndexFile = match std::fs::read_to_string(index_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
        {
            Some(index) => index,
            None => {
                info!("No usable index at {:?}, starting empty", index_path);
                return Ok(store);
            }
        };

        let metadata: Vec<FrameMetadata> = match std::fs::read_to_string(metadata_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
        {
            Some(metadata) => metadata,
            None => {
                warn!(
                    "Index present but metadata unreadable at {:?}, starting empty",
                    metadata_path
                );
                return Ok(store);
            }
        };

        if index.dimensions != dimensions {
            warn!(
                "Stored index has {} dimensions, expected {}; starting empty",
                index.dimensions, dimensions
            );
            return Ok(store);
        }

        if index.vectors.len() != metadata.len() {
            warn!(
                "Index/metadata count mismatch ({} vs {}); starting empty",
                index.vectors.len(),
                metadata.len()
            );
            return Ok(store);
        }

        info!("Loaded {} records from {:?}", index.vectors.len(), index_path);

        *store.inner.write().unwrap() = Inner {
            vectors: index.vectors,
            metadata,
        };

        Ok(store)
    }

    /// Write the index and metadata files.
    ///
    /// Both files are rewritten in full; they are logically one unit. A crash
    /// between the two writes leaves them inconsistent, which `open` detects
    /// and treats as no prior data.
    pub fn persist(&self, index_path: &Path, metadata_path: &Path) -> Result<()> {
        let inner = self.inner.read().unwrap();

        if let Some(parent) = index_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Some(parent) = metadata_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let index = IndexFile {
            dimensions: self.dimensions,
            metric: METRIC_L2.to_string(),
            vectors: inner.vectors.clone(),
        };

        std::fs::write(index_path, serde_json::to_string(&index)?)?;
        std::fs::write(metadata_path, serde_json::to_string(&inner.metadata)?)?;

        info!("Persisted {} records to {:?}", inner.vectors.len(), index_path);
        Ok(())
    }

    /// Append a vector with its metadata and return the assigned id.
    ///
    /// The id equals the record's insertion order (the nth inserted record
    /// gets id n-1). No automatic persistence; call `persist` after a batch.
    pub fn add_record(&self, vector: Vec<f32>, metadata: FrameMetadata) -> Result<usize> {
        if vector.len() != self.dimensions {
            return Err(BlikkError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        let mut inner = self.inner.write().unwrap();
        inner.vectors.push(vector);
        inner.metadata.push(metadata);

        let id = inner.vectors.len() - 1;
        debug!("Added record {}", id);
        Ok(id)
    }

    /// Return the k nearest records to the query, nearest first.
    ///
    /// Distances are squared Euclidean; ties are broken by insertion order
    /// (lower id wins). Fewer than k stored records returns all of them; an
    /// empty index returns an empty vector.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimensions {
            return Err(BlikkError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let inner = self.inner.read().unwrap();

        let mut scored: Vec<(usize, f32)> = inner
            .vectors
            .iter()
            .enumerate()
            .map(|(id, v)| (id, squared_l2(query, v)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        let hits = scored
            .into_iter()
            .map(|(id, distance)| SearchHit {
                id,
                distance,
                metadata: inner.metadata[id].clone(),
            })
            .collect();

        Ok(hits)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().vectors.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured vector dimensionality.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Summarize indexed source videos, most frames first.
    pub fn sources(&self) -> Vec<IndexedSource> {
        let inner = self.inner.read().unwrap();

        let mut by_source: HashMap<String, IndexedSource> = HashMap::new();
        for meta in &inner.metadata {
            let entry = by_source
                .entry(meta.source_path.clone())
                .or_insert_with(|| IndexedSource {
                    source_path: meta.source_path.clone(),
                    frame_count: 0,
                    last_timestamp: 0.0,
                });
            entry.frame_count += 1;
            if meta.timestamp > entry.last_timestamp {
                entry.last_timestamp = meta.timestamp;
            }
        }

        let mut sources: Vec<IndexedSource> = by_source.into_values().collect();
        sources.sort_by(|a, b| b.frame_count.cmp(&a.frame_count));
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(source: &str, timestamp: f64) -> FrameMetadata {
        FrameMetadata {
            source_path: source.to_string(),
            timestamp,
            description: format!("frame at {timestamp}"),
        }
    }

    #[test]
    fn test_ids_are_sequential() {
        let store = FlatVectorStore::new(3);

        for i in 0..5 {
            let id = store
                .add_record(vec![i as f32, 0.0, 0.0], meta("a.mp4", i as f64))
                .unwrap();
            assert_eq!(id, i);
        }

        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_exact_vector_is_top_hit_at_distance_zero() {
        let store = FlatVectorStore::new(3);
        store.add_record(vec![1.0, 0.0, 0.0], meta("a.mp4", 0.0)).unwrap();
        store.add_record(vec![0.0, 1.0, 0.0], meta("a.mp4", 1.0)).unwrap();
        store.add_record(vec![0.0, 0.0, 1.0], meta("a.mp4", 2.0)).unwrap();

        let hits = store.search(&[0.0, 1.0, 0.0], 3).unwrap();
        assert_eq!(hits[0].id, 1);
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_ties_broken_by_insertion_order() {
        let store = FlatVectorStore::new(2);
        // Two records equidistant from the query.
        store.add_record(vec![1.0, 0.0], meta("a.mp4", 0.0)).unwrap();
        store.add_record(vec![-1.0, 0.0], meta("a.mp4", 1.0)).unwrap();

        let hits = store.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].id, 0);
        assert_eq!(hits[1].id, 1);
    }

    #[test]
    fn test_search_caps_at_store_size_and_handles_empty() {
        let store = FlatVectorStore::new(2);
        assert!(store.search(&[0.0, 0.0], 10).unwrap().is_empty());

        store.add_record(vec![1.0, 1.0], meta("a.mp4", 0.0)).unwrap();
        let hits = store.search(&[0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let store = FlatVectorStore::new(3);

        let err = store
            .add_record(vec![1.0, 2.0], meta("a.mp4", 0.0))
            .unwrap_err();
        assert!(matches!(
            err,
            BlikkError::DimensionMismatch { expected: 3, actual: 2 }
        ));

        let err = store.search(&[1.0], 5).unwrap_err();
        assert!(matches!(
            err,
            BlikkError::DimensionMismatch { expected: 3, actual: 1 }
        ));
    }

    #[test]
    fn test_persist_then_open_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("index.json");
        let metadata_path = dir.path().join("metadata.json");

        let store = FlatVectorStore::new(2);
        store.add_record(vec![1.0, 0.0], meta("a.mp4", 0.0)).unwrap();
        store.add_record(vec![0.0, 1.0], meta("b.mp4", 3.5)).unwrap();
        store.persist(&index_path, &metadata_path).unwrap();

        let reopened = FlatVectorStore::open(&index_path, &metadata_path, 2).unwrap();
        assert_eq!(reopened.len(), 2);

        let before = store.search(&[0.9, 0.1], 2).unwrap();
        let after = reopened.search(&[0.9, 0.1], 2).unwrap();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.id, a.id);
            assert!((b.distance - a.distance).abs() < 1e-6);
            assert_eq!(b.metadata, a.metadata);
        }
    }

    #[test]
    fn test_open_missing_files_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlatVectorStore::open(
            &dir.path().join("index.json"),
            &dir.path().join("metadata.json"),
            4,
        )
        .unwrap();
        assert!(store.is_empty());
        assert_eq!(store.dimensions(), 4);
    }

    #[test]
    fn test_open_malformed_files_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("index.json");
        let metadata_path = dir.path().join("metadata.json");
        std::fs::write(&index_path, "not json").unwrap();
        std::fs::write(&metadata_path, "[]").unwrap();

        let store = FlatVectorStore::open(&index_path, &metadata_path, 4).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_count_mismatch_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("index.json");
        let metadata_path = dir.path().join("metadata.json");

        let store = FlatVectorStore::new(2);
        store.add_record(vec![1.0, 0.0], meta("a.mp4", 0.0)).unwrap();
        store.persist(&index_path, &metadata_path).unwrap();

        // Simulate a crash between the two writes.
        std::fs::write(&metadata_path, "[]").unwrap();

        let reopened = FlatVectorStore::open(&index_path, &metadata_path, 2).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_sources_summary() {
        let store = FlatVectorStore::new(2);
        store.add_record(vec![1.0, 0.0], meta("a.mp4", 0.0)).unwrap();
        store.add_record(vec![0.0, 1.0], meta("a.mp4", 5.0)).unwrap();
        store.add_record(vec![1.0, 1.0], meta("b.mp4", 2.0)).unwrap();

        let sources = store.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_path, "a.mp4");
        assert_eq!(sources[0].frame_count, 2);
        assert!((sources[0].last_timestamp - 5.0).abs() < f64::EPSILON);
    }
}
