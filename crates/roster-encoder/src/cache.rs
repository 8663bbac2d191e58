//! Embedding cache keyed by cohort snapshot
//!
//! Encoding is a pure function of the cohort graph and the encoder
//! configuration, so repeated runs over an unchanged snapshot can reuse the
//! previous result. The key combines the graph fingerprint with the encoder's
//! cache key; any change to members, features or edges yields a new
//! fingerprint and therefore a miss.

use crate::{EncoderError, Embeddings, GraphEncoder};
use roster_graph::CohortGraph;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: usize,
    /// Lookups that had to encode
    pub misses: usize,
    /// Entries evicted for capacity
    pub evictions: usize,
}

/// Bounded embedding cache with oldest-first eviction
#[derive(Debug)]
pub struct EmbeddingCache {
    capacity: usize,
    entries: HashMap<String, Embeddings>,
    order: VecDeque<String>,
    stats: CacheStats,
}

impl EmbeddingCache {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    fn key(fingerprint: &str, encoder_key: &str) -> String {
        format!("{}:{}", fingerprint, encoder_key)
    }

    /// Cached embeddings for `graph`, encoding and storing them on a miss
    pub fn get_or_encode<E: GraphEncoder>(
        &mut self,
        graph: &CohortGraph,
        encoder: &E,
    ) -> Result<Embeddings, EncoderError> {
        if let Some(hit) = self.lookup(graph, encoder) {
            return Ok(hit);
        }
        let embeddings = encoder.encode(graph)?;
        self.store(graph, encoder, embeddings.clone());
        Ok(embeddings)
    }

    /// Cached embeddings for `graph`, if any
    ///
    /// Counts a hit or a miss. Pair with [`EmbeddingCache::store`] when the
    /// encoding should happen outside a lock around the cache.
    pub fn lookup<E: GraphEncoder>(&mut self, graph: &CohortGraph, encoder: &E) -> Option<Embeddings> {
        let key = Self::key(graph.fingerprint(), &encoder.cache_key());
        match self.entries.get(&key) {
            Some(hit) => {
                self.stats.hits += 1;
                debug!(cohort = graph.cohort(), "Embedding cache hit");
                Some(hit.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store embeddings computed for `graph` by `encoder`
    pub fn store<E: GraphEncoder>(&mut self, graph: &CohortGraph, encoder: &E, embeddings: Embeddings) {
        let key = Self::key(graph.fingerprint(), &encoder.cache_key());
        if self.entries.contains_key(&key) {
            self.entries.insert(key, embeddings);
            return;
        }
        self.insert(key, embeddings);
    }

    fn insert(&mut self, key: String, embeddings: Embeddings) {
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.entries.remove(&oldest).is_some() {
                self.stats.evictions += 1;
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, embeddings);
    }

    /// Drop every entry computed from the snapshot with `fingerprint`
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, fingerprint: &str) -> usize {
        let prefix = format!("{}:", fingerprint);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(&prefix));
        self.order.retain(|key| !key.starts_with(&prefix));
        before - self.entries.len()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit/miss counters
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrainingSummary;
    use roster_domain::member::attributes;
    use roster_domain::{Member, MemberId, RelationType, RelationshipEdge};
    use roster_graph::GraphBuilder;
    use std::cell::Cell;

    /// Encoder that counts how often it actually runs
    struct CountingEncoder {
        calls: Cell<usize>,
        key: &'static str,
    }

    impl CountingEncoder {
        fn new(key: &'static str) -> Self {
            Self {
                calls: Cell::new(0),
                key,
            }
        }
    }

    impl GraphEncoder for CountingEncoder {
        fn encode(&self, graph: &CohortGraph) -> Result<Embeddings, EncoderError> {
            self.calls.set(self.calls.get() + 1);
            let vectors = vec![vec![1.0]; graph.len()];
            Embeddings::new(graph.member_ids(), vectors, TrainingSummary::default())
        }

        fn dimension(&self) -> usize {
            1
        }

        fn cache_key(&self) -> String {
            self.key.to_string()
        }
    }

    fn graph(extra_edge: bool) -> CohortGraph {
        let members = (1..=3)
            .map(|id| Member::new(MemberId::new(id), "2025").with_attribute(attributes::ACADEMIC, id as f64))
            .collect();
        let mut edges = vec![RelationshipEdge::new(MemberId::new(1), MemberId::new(2), RelationType::Friend)];
        if extra_edge {
            edges.push(RelationshipEdge::new(MemberId::new(2), MemberId::new(3), RelationType::Friend));
        }
        GraphBuilder::default_config()
            .build_snapshot("2025", members, edges)
            .unwrap()
            .0
    }

    #[test]
    fn test_hit_on_unchanged_snapshot() {
        let mut cache = EmbeddingCache::new(4);
        let encoder = CountingEncoder::new("a");
        let g = graph(false);

        let first = cache.get_or_encode(&g, &encoder).unwrap();
        let second = cache.get_or_encode(&g, &encoder).unwrap();

        assert_eq!(first, second);
        assert_eq!(encoder.calls.get(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_miss_on_changed_snapshot() {
        let mut cache = EmbeddingCache::new(4);
        let encoder = CountingEncoder::new("a");

        cache.get_or_encode(&graph(false), &encoder).unwrap();
        cache.get_or_encode(&graph(true), &encoder).unwrap();

        assert_eq!(encoder.calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_miss_on_different_encoder_config() {
        let mut cache = EmbeddingCache::new(4);
        let g = graph(false);
        let a = CountingEncoder::new("a");
        let b = CountingEncoder::new("b");

        cache.get_or_encode(&g, &a).unwrap();
        cache.get_or_encode(&g, &b).unwrap();

        assert_eq!(a.calls.get() + b.calls.get(), 2);
    }

    #[test]
    fn test_oldest_entry_evicted() {
        let mut cache = EmbeddingCache::new(1);
        let encoder = CountingEncoder::new("a");
        let old = graph(false);
        let new = graph(true);

        cache.get_or_encode(&old, &encoder).unwrap();
        cache.get_or_encode(&new, &encoder).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 1);

        // Old snapshot has to be encoded again
        cache.get_or_encode(&old, &encoder).unwrap();
        assert_eq!(encoder.calls.get(), 3);
    }

    #[test]
    fn test_lookup_then_store() {
        let mut cache = EmbeddingCache::new(4);
        let encoder = CountingEncoder::new("a");
        let g = graph(false);

        assert!(cache.lookup(&g, &encoder).is_none());
        let embeddings = encoder.encode(&g).unwrap();
        cache.store(&g, &encoder, embeddings.clone());
        cache.store(&g, &encoder, embeddings.clone());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(&g, &encoder), Some(embeddings));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = EmbeddingCache::new(4);
        let g = graph(false);
        cache.get_or_encode(&g, &CountingEncoder::new("a")).unwrap();
        cache.get_or_encode(&g, &CountingEncoder::new("b")).unwrap();
        cache.get_or_encode(&graph(true), &CountingEncoder::new("a")).unwrap();

        assert_eq!(cache.invalidate(g.fingerprint()), 2);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
