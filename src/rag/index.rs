//! Exact inner-product vector index.
//!
//! Vectors are stored row-major in a single buffer; position `i` is the
//! `i`-th inserted vector. Scores are raw dot products, so ranking equals
//! cosine ranking only when the stored vectors are unit-normalised.

use std::cmp::Ordering;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("vector index dimension must be non-zero")]
    ZeroDimension,
    #[error("cannot insert an empty vector")]
    EmptyVector,
    #[error("dimension mismatch at position {position}: expected {expected}, got {actual}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        actual: usize,
    },
}

/// A single search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Result<Self, IndexError> {
        if dimension == 0 {
            return Err(IndexError::ZeroDimension);
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    /// Builds an index from vectors in corpus order.
    ///
    /// Returns `Ok(None)` when there is nothing to index; the dimension is
    /// taken from the first vector and every other vector must match it.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Option<Self>, IndexError> {
        let Some(first) = vectors.first() else {
            return Ok(None);
        };
        if first.is_empty() {
            return Err(IndexError::EmptyVector);
        }

        let mut index = Self::new(first.len())?;
        index.data.reserve(first.len() * vectors.len());
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(Some(index))
    }

    /// Appends a vector and returns its position.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize, IndexError> {
        if vector.is_empty() {
            return Err(IndexError::EmptyVector);
        }
        let position = self.len();
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                position,
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.data.extend_from_slice(vector);
        Ok(position)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the `k` best hits by descending score, comparing the query
    /// against every stored vector. Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if query.is_empty() || k == 0 || self.is_empty() {
            return Vec::new();
        }
        if query.len() != self.dimension {
            tracing::warn!(
                "Query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            );
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| SearchHit {
                position,
                score: rankable(dot(query, stored)),
            })
            .collect();

        hits.sort_by(|left, right| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.position.cmp(&right.position))
        });
        hits.truncate(k);
        hits
    }
}

/// NaN (e.g. `inf * 0`) ranks below every real score.
fn rankable(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

fn dot(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).map(|(a, b)| a * b).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basis(dimension: usize) -> Vec<Vec<f32>> {
        (0..dimension)
            .map(|i| {
                let mut v = vec![0.0; dimension];
                v[i] = 1.0;
                v
            })
            .collect()
    }

    #[test]
    fn build_of_nothing_is_absent() {
        assert_eq!(VectorIndex::build(&[]).map(|index| index.is_none()), Ok(true));
    }

    #[test]
    fn dimension_comes_from_first_vector() {
        let index = VectorIndex::build(&[vec![0.1, 0.2, 0.3], vec![0.0, 1.0, 0.0]])
            .expect("build")
            .expect("index present");
        assert_eq!(index.dimension(), 3);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn mismatched_dimension_fails_construction() {
        let err = VectorIndex::build(&[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                position: 1,
                expected: 2,
                actual: 3
            }
        );

        let mut index = VectorIndex::new(2).expect("index");
        assert!(index.add(&[1.0]).is_err());
        assert!(index.add(&[]).is_err());
        assert_eq!(index.len(), 0);
        assert_eq!(VectorIndex::new(0).unwrap_err(), IndexError::ZeroDimension);
    }

    #[test]
    fn orthogonal_query_finds_itself_first() {
        let vectors = basis(5);
        let index = VectorIndex::build(&vectors).expect("build").expect("index");

        for (i, vector) in vectors.iter().enumerate() {
            let hits = index.search(vector, 1);
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].position, i);
            assert!((hits[0].score - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn k_larger_than_index_returns_everything_once() {
        let index = VectorIndex::build(&basis(4)).expect("build").expect("index");
        let hits = index.search(&[0.4, 0.3, 0.2, 0.1], 10);

        assert_eq!(hits.len(), 4);
        let mut positions: Vec<usize> = hits.iter().map(|hit| hit.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        positions.dedup();
        assert_eq!(positions.len(), 4);
        assert!(hits.iter().all(|hit| hit.position < index.len()));
    }

    #[test]
    fn scores_are_raw_dot_products_not_cosine() {
        let index = VectorIndex::build(&[vec![1.0, 0.0], vec![3.0, 0.0]])
            .expect("build")
            .expect("index");
        let hits = index.search(&[2.0, 0.0], 2);

        assert_eq!(hits[0], SearchHit { position: 1, score: 6.0 });
        assert_eq!(hits[1], SearchHit { position: 0, score: 2.0 });
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let index = VectorIndex::build(&[vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]])
            .expect("build")
            .expect("index");
        let hits = index.search(&[1.0, 0.0], 3);
        let positions: Vec<usize> = hits.iter().map(|hit| hit.position).collect();
        assert_eq!(positions, vec![1, 2, 0]);
    }

    #[test]
    fn degenerate_queries_return_nothing() {
        let index = VectorIndex::build(&basis(3)).expect("build").expect("index");
        assert!(index.search(&[], 3).is_empty());
        assert!(index.search(&[1.0, 0.0, 0.0], 0).is_empty());
        assert!(index.search(&[1.0, 0.0], 3).is_empty());
    }

    #[test]
    fn nan_scores_rank_last() {
        let index = VectorIndex::build(&[
            vec![f32::INFINITY, 0.0],
            vec![0.0, 1.0],
            vec![0.5, 0.5],
        ])
        .expect("build")
        .expect("index");

        let hits = index.search(&[0.0, 1.0], 3);
        assert_eq!(
            hits.iter().map(|hit| hit.position).collect::<Vec<_>>(),
            vec![1, 2, 0]
        );
        assert_eq!(hits[0].score, 1.0);
        assert_eq!(hits[2].score, f32::NEG_INFINITY);
    }
}
