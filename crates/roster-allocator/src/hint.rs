//! Advisory group hints from embedding clusters
//!
//! Seeded k-means over member embeddings. The resulting labels only bias the
//! allocator objective; they never constrain it.

use crate::AllocatorError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roster_encoder::Embeddings;
use tracing::debug;

/// Hint label per member, in embedding order
#[derive(Debug, Clone, PartialEq)]
pub struct HintLabels {
    /// Label in `0..k` for each member
    pub labels: Vec<usize>,

    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,

    /// Lloyd iterations run by the winning restart
    pub iterations: usize,
}

impl HintLabels {
    /// Number of labelled members
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no member is labelled
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Seeded k-means clusterer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HintClusterer {
    iterations: usize,
    restarts: usize,
    seed: u64,
}

impl HintClusterer {
    /// Create a clusterer
    pub fn new(iterations: usize, restarts: usize, seed: u64) -> Self {
        Self {
            iterations: iterations.max(1),
            restarts: restarts.max(1),
            seed,
        }
    }

    /// Cluster `embeddings` into `k` groups
    ///
    /// Labels are renumbered in order of first appearance, so two runs that
    /// find the same partition report identical labels.
    pub fn fit(&self, embeddings: &Embeddings, k: usize) -> Result<HintLabels, AllocatorError> {
        let points = embeddings.vectors();
        let n = points.len();
        if k == 0 || k > n {
            return Err(AllocatorError::Config(format!(
                "cannot form {} clusters from {} members",
                k, n
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<HintLabels> = None;
        for _ in 0..self.restarts {
            let candidate = self.lloyd(points, k, &mut rng);
            if best.as_ref().map_or(true, |b| candidate.inertia < b.inertia) {
                best = Some(candidate);
            }
        }

        let mut best = best.ok_or_else(|| AllocatorError::InvalidInput("no clustering restarts ran".into()))?;
        best.labels = canonicalize(&best.labels, k);
        debug!(k, inertia = best.inertia, iterations = best.iterations, "Hint clustering finished");
        Ok(best)
    }

    fn lloyd(&self, points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> HintLabels {
        let mut centroids = seed_centroids(points, k, rng);
        let mut labels = vec![usize::MAX; points.len()];
        let mut iterations = 0;

        for _ in 0..self.iterations {
            iterations += 1;
            let mut changed = false;
            for (i, p) in points.iter().enumerate() {
                let label = nearest(p, &centroids).0;
                if labels[i] != label {
                    labels[i] = label;
                    changed = true;
                }
            }

            update_centroids(points, &labels, &mut centroids);
            if !changed {
                break;
            }
        }

        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(p, &l)| squared_distance(p, &centroids[l]))
            .sum();
        HintLabels {
            labels,
            inertia,
            iterations,
        }
    }
}

/// k-means++ seeding
fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = vec![points[rng.gen_range(0..points.len())].clone()];
    while centroids.len() < k {
        let weights: Vec<f64> = points.iter().map(|p| nearest(p, &centroids).1).collect();
        let total: f64 = weights.iter().sum();
        let next = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = points.len() - 1;
            for (i, w) in weights.iter().enumerate() {
                if target < *w {
                    chosen = i;
                    break;
                }
                target -= w;
            }
            chosen
        } else {
            rng.gen_range(0..points.len())
        };
        centroids.push(points[next].clone());
    }
    centroids
}

fn update_centroids(points: &[Vec<f64>], labels: &[usize], centroids: &mut [Vec<f64>]) {
    let dim = points[0].len();
    let mut sums = vec![vec![0.0; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];
    for (p, &l) in points.iter().zip(labels) {
        counts[l] += 1;
        for (s, x) in sums[l].iter_mut().zip(p) {
            *s += x;
        }
    }

    for c in 0..centroids.len() {
        if counts[c] > 0 {
            centroids[c] = sums[c].iter().map(|s| s / counts[c] as f64).collect();
        } else {
            // Re-seed an empty cluster with the point farthest from its centroid
            let farthest = points
                .iter()
                .zip(labels)
                .map(|(p, &l)| squared_distance(p, &centroids[l]))
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |acc, (i, d)| if d > acc.1 { (i, d) } else { acc })
                .0;
            centroids[c] = points[farthest].clone();
        }
    }
}

/// Index of the nearest centroid and its squared distance (ties go to the lowest index)
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn canonicalize(labels: &[usize], k: usize) -> Vec<usize> {
    let mut mapping = vec![usize::MAX; k.max(labels.iter().copied().max().map_or(0, |m| m + 1))];
    let mut next = 0;
    labels
        .iter()
        .map(|&l| {
            if mapping[l] == usize::MAX {
                mapping[l] = next;
                next += 1;
            }
            mapping[l]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_domain::MemberId;
    use roster_encoder::TrainingSummary;

    fn embeddings(points: Vec<Vec<f64>>) -> Embeddings {
        let ids = (1..=points.len() as u64).map(MemberId::new).collect();
        Embeddings::new(ids, points, TrainingSummary::default()).unwrap()
    }

    fn two_blobs() -> Embeddings {
        embeddings(vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
        ])
    }

    #[test]
    fn test_separates_blobs() {
        let hints = HintClusterer::new(100, 5, 42).fit(&two_blobs(), 2).unwrap();

        assert_eq!(hints.labels, vec![0, 0, 0, 1, 1, 1]);
        assert!(hints.inertia < 0.1);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let e = two_blobs();
        let a = HintClusterer::new(100, 3, 7).fit(&e, 3).unwrap();
        let b = HintClusterer::new(100, 3, 7).fit(&e, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_labels_in_range() {
        let hints = HintClusterer::new(50, 2, 1).fit(&two_blobs(), 4).unwrap();
        assert_eq!(hints.len(), 6);
        assert!(hints.labels.iter().all(|&l| l < 4));
    }

    #[test]
    fn test_identical_points() {
        let e = embeddings(vec![vec![1.0, 1.0]; 4]);
        let hints = HintClusterer::new(10, 2, 3).fit(&e, 2).unwrap();
        assert_eq!(hints.inertia, 0.0);
        assert!(hints.labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn test_invalid_k() {
        let clusterer = HintClusterer::new(10, 1, 0);
        assert!(matches!(clusterer.fit(&two_blobs(), 0), Err(AllocatorError::Config(_))));
        assert!(matches!(clusterer.fit(&two_blobs(), 7), Err(AllocatorError::Config(_))));
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize(&[2, 2, 0, 1, 0], 3), vec![0, 0, 1, 2, 1]);
    }
}
