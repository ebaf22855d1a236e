//! Process-local backend: exact cosine search over a `Vec` of records per collection.

use std::collections::HashMap;

use super::{CollectionInfo, Metadata, MetadataFilter, Record, RetrievalResult};
use crate::error::StoreError;

#[derive(Debug)]
struct MemoryCollection {
    dimension: usize,
    records: Vec<Record>,
    /// Record id to its position in `records`.
    positions: HashMap<String, usize>,
}

/// Non-persistent storage used for development and as the fallback when Qdrant is unreachable.
///
/// ```
/// use ollama_cli_agent::vector_store::{InMemoryBackend, Metadata, Record};
///
/// let mut backend = InMemoryBackend::new();
/// backend.create_collection("notes", 2);
/// let record = Record { id: "a".into(), vector: vec![1.0, 0.0], payload: Metadata::new() };
/// backend.upsert("notes", &[record]).unwrap();
/// assert_eq!(backend.search("notes", &[1.0, 0.0], 1, None).unwrap().len(), 1);
/// assert!(backend.delete_collection("notes").is_ok());
/// assert!(!backend.has_collection("notes"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    collections: HashMap<String, MemoryCollection>,
}

impl InMemoryBackend {
    /// An empty backend with no collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` has been created.
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Create `name` with vectors of `dimension`. An existing collection is left as it is,
    /// including its dimension.
    pub fn create_collection(&mut self, name: &str, dimension: usize) {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| MemoryCollection {
                dimension,
                records: Vec::new(),
                positions: HashMap::new(),
            });
    }

    /// Insert a batch. The whole batch is validated before anything is written.
    /// A record whose id already exists replaces the stored one in place.
    ///
    /// # Errors
    /// - [`StoreError::CollectionNotFound`] if `name` was never created.
    /// - [`StoreError::DimensionMismatch`] if any vector has the wrong length.
    pub fn upsert(&mut self, name: &str, batch: &[Record]) -> Result<(), StoreError> {
        let collection = self.collection_mut(name)?;
        if let Some(bad) = batch.iter().find(|r| r.vector.len() != collection.dimension) {
            return Err(StoreError::DimensionMismatch {
                expected: collection.dimension,
                got: bad.vector.len(),
            });
        }

        for record in batch {
            match collection.positions.get(&record.id) {
                Some(&at) => collection.records[at] = record.clone(),
                None => {
                    collection
                        .positions
                        .insert(record.id.clone(), collection.records.len());
                    collection.records.push(record.clone());
                }
            }
        }
        Ok(())
    }

    /// Exact top-`k` search by cosine similarity, highest first.
    ///
    /// Records whose score is not finite are never returned.
    ///
    /// # Errors
    /// [`StoreError::CollectionNotFound`] or [`StoreError::DimensionMismatch`] for the query.
    pub fn search(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>, StoreError> {
        let collection = self.collection(name)?;
        if query.len() != collection.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: collection.dimension,
                got: query.len(),
            });
        }

        let mut scored: Vec<(&Record, f32)> = collection
            .records
            .iter()
            .filter(|r| filter.is_none_or(|f| matches_filter(&r.payload, f)))
            .map(|r| (r, cosine_similarity(query, &r.vector)))
            .filter(|(_, score)| score.is_finite())
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(record, score)| RetrievalResult::from_payload(record.payload.clone(), score))
            .collect())
    }

    /// Drop `name` and its records.
    ///
    /// # Errors
    /// [`StoreError::CollectionNotFound`] if there is nothing to drop.
    pub fn delete_collection(&mut self, name: &str) -> Result<(), StoreError> {
        self.collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Record count of `name`. The status is always `"green"`.
    pub fn collection_info(&self, name: &str) -> Result<CollectionInfo, StoreError> {
        let collection = self.collection(name)?;
        let count = collection.records.len() as u64;
        Ok(CollectionInfo {
            name: name.to_string(),
            vectors_count: count,
            points_count: count,
            status: "green".to_string(),
        })
    }

    fn collection(&self, name: &str) -> Result<&MemoryCollection, StoreError> {
        self.collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut MemoryCollection, StoreError> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }
}

/// Cosine similarity of two equal-length vectors, in `[-1, 1]`.
///
/// A zero-norm input has no direction and scores `0.0` against everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

fn matches_filter(payload: &Metadata, filter: &MetadataFilter) -> bool {
    filter
        .iter()
        .all(|(key, expected)| payload.get(key) == Some(expected))
}
