//! Adjacency-list input.
//!
//! The format is a sequence of blocks, one per node: a header line holding
//! the node id and its neighbor count, followed by that many lines with one
//! neighbor id each.
//!
//! ```text
//! # comment
//! 1 2
//! 2
//! 3
//! 2 1
//! 3
//! ```
//!
//! Blank lines and `#` comments are ignored. One file is one partition.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::record::NodeRecord;

/// Upper bound on the neighbor capacity reserved from a block header; the
/// announced count is untrusted until the neighbor lines are actually read.
const MAX_RESERVED_NEIGHBORS: usize = 1 << 16;

/// Errors produced while reading adjacency lists.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The text does not follow the adjacency-list format.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was expected.
        reason: String,
    },
}

fn parse_id(token: &str, line: usize) -> Result<i64, ReadError> {
    token.parse().map_err(|_| ReadError::Parse {
        line,
        reason: format!("`{token}` is not an integer id"),
    })
}

/// Reads every block from `input`.
///
/// # Errors
/// [`ReadError::Io`] if reading fails, [`ReadError::Parse`] on malformed
/// headers, malformed ids or truncated blocks.
pub fn read_adjacency_list(input: impl BufRead) -> Result<Vec<NodeRecord>, ReadError> {
    let mut records = Vec::new();
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| {
            l.as_ref()
                .map_or(true, |l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        });

    while let Some((line_no, header)) = lines.next() {
        let header = header?;
        let mut fields = header.split_whitespace();
        let (Some(id), Some(count), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(ReadError::Parse {
                line: line_no,
                reason: "expected `<id> <neighbor count>`".to_owned(),
            });
        };
        let id = parse_id(id, line_no)?;
        let count: usize = count.parse().map_err(|_| ReadError::Parse {
            line: line_no,
            reason: format!("`{count}` is not a neighbor count"),
        })?;

        let mut neighbors = Vec::with_capacity(count.min(MAX_RESERVED_NEIGHBORS));
        for _ in 0..count {
            let Some((n_line, text)) = lines.next() else {
                return Err(ReadError::Parse {
                    line: line_no,
                    reason: format!("node {id} announces {count} neighbors, found {}", neighbors.len()),
                });
            };
            neighbors.push(parse_id(text?.trim(), n_line)?);
        }
        records.push(NodeRecord::new(id, neighbors));
    }
    tracing::trace!(records = records.len(), "read adjacency list");
    Ok(records)
}

/// Reads an adjacency-list file.
///
/// # Errors
/// See [`read_adjacency_list`].
pub fn read_adjacency_file(path: impl AsRef<Path>) -> Result<Vec<NodeRecord>, ReadError> {
    let file = File::open(path.as_ref())?;
    read_adjacency_list(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_blocks_and_skips_comments() {
        let text = "# two nodes\n1 2\n2\n3\n\n2 1\n3\n4 0\n";
        let records = read_adjacency_list(text.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                NodeRecord::new(1, vec![2, 3]),
                NodeRecord::new(2, vec![3]),
                NodeRecord::new(4, vec![]),
            ]
        );
    }

    #[test]
    fn reports_line_numbers() {
        let err = read_adjacency_list("1 1\nx\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReadError::Parse { line: 2, .. }), "{err}");

        let err = read_adjacency_list("1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReadError::Parse { line: 1, .. }));

        let err = read_adjacency_list("1 3\n2\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("announces 3 neighbors, found 1"));
    }

    #[test]
    fn oversized_neighbor_count_is_a_truncated_block() {
        let err = read_adjacency_list("1 1000000000000000\n2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReadError::Parse { line: 1, .. }), "{err}");
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn negative_ids_parse_and_are_left_to_the_builder() {
        let records = read_adjacency_list("-4 1\n2\n".as_bytes()).unwrap();
        assert_eq!(records[0].id, -4);
    }
}
