//! Contiguous partitioning of a queue into wire-sized chunks.

use super::operation::BatchOperation;

/// A contiguous slice of the original queue, tagged with global positions.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `indices[k]` is the original queue position of `operations[k]`.
    pub indices: Vec<usize>,
    pub operations: Vec<BatchOperation>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Number of chunks `n` operations need at `chunk_size`.
pub fn chunk_count(n: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    n.div_ceil(chunk_size)
}

/// Splits `operations` into chunks of `chunk_size`; chunk `i` holds
/// positions `[i*chunk_size, min((i+1)*chunk_size, n))`.
///
/// A zero `chunk_size` is treated as 1.
pub fn split(operations: Vec<BatchOperation>, chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let mut chunks: Vec<Chunk> = Vec::with_capacity(chunk_count(operations.len(), chunk_size));

    for (index, op) in operations.into_iter().enumerate() {
        if index % chunk_size == 0 {
            chunks.push(Chunk {
                indices: Vec::with_capacity(chunk_size),
                operations: Vec::with_capacity(chunk_size),
            });
        }
        if let Some(chunk) = chunks.last_mut() {
            chunk.indices.push(index);
            chunk.operations.push(op);
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::HttpVerb;

    fn ops(n: usize) -> Vec<BatchOperation> {
        (0..n)
            .map(|i| BatchOperation::new(format!("obj/{}", i), HttpVerb::Get, "t"))
            .collect()
    }

    #[test]
    fn test_split_sizes() {
        for (n, c) in [(0, 10), (1, 10), (10, 10), (11, 10), (25, 10), (100, 10), (7, 3)] {
            let chunks = split(ops(n), c);
            assert_eq!(chunks.len(), chunk_count(n, c), "n={} c={}", n, c);
            for (i, chunk) in chunks.iter().enumerate() {
                if i + 1 < chunks.len() {
                    assert_eq!(chunk.len(), c);
                } else {
                    let tail = if n % c == 0 { c } else { n % c };
                    assert_eq!(chunk.len(), tail);
                }
            }
        }
    }

    #[test]
    fn test_split_records_global_indices() {
        let chunks = split(ops(23), 10);
        assert_eq!(chunks[0].indices, (0..10).collect::<Vec<_>>());
        assert_eq!(chunks[1].indices, (10..20).collect::<Vec<_>>());
        assert_eq!(chunks[2].indices, vec![20, 21, 22]);
        assert_eq!(chunks[2].operations[1].path(), "obj/21");
    }

    #[test]
    fn test_split_zero_chunk_size() {
        let chunks = split(ops(3), 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunk_count(3, 0), 0);
    }
}
