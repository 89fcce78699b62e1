//! Dependency ordering (stage 3)
//!
//! Orders the batch so a parent span precedes its children whenever both
//! are present. Spans whose parent is not in the batch keep their relative
//! order; resolving those parents is the placeholder stage's job.

use std::collections::HashMap;

use super::types::SpanRecord;

/// Visit state for the topological walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// Produce a parent-before-child total order over the batch.
///
/// Each span has at most one in-batch parent edge, so the classic
/// two-marker depth-first visit reduces to walking up parent chains with
/// an explicit path vector - no recursion. A chain that reaches a span
/// already on the current path is a cycle: it is logged and the edge is
/// ignored for ordering only; the persisted rows keep their parent ids.
pub fn sort_by_dependency(spans: Vec<SpanRecord>) -> Vec<SpanRecord> {
    if spans.len() < 2 {
        return spans;
    }

    let index: HashMap<&str, usize> = spans
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id(), i))
        .collect();

    let mut marks = vec![Mark::Unvisited; spans.len()];
    let mut order = Vec::with_capacity(spans.len());

    for start in 0..spans.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        // Walk up the parent chain until it leaves the batch, reaches an
        // already-ordered span, or closes a cycle.
        let mut path = Vec::new();
        let mut current = start;
        loop {
            marks[current] = Mark::Visiting;
            path.push(current);

            let parent = spans[current]
                .parent_id()
                .and_then(|pid| index.get(pid).copied());

            match parent {
                Some(p) if marks[p] == Mark::Unvisited => current = p,
                Some(p) if marks[p] == Mark::Visiting => {
                    tracing::warn!(
                        span_id = %spans[current].id(),
                        parent_id = %spans[p].id(),
                        "Parent cycle detected, ignoring edge for ordering"
                    );
                    break;
                }
                _ => break,
            }
        }

        // Deepest ancestor first
        for &i in path.iter().rev() {
            marks[i] = Mark::Visited;
            order.push(i);
        }
    }

    // Reorder without cloning the records
    let mut slots: Vec<Option<SpanRecord>> = spans.into_iter().map(Some).collect();
    order
        .into_iter()
        .map(|i| slots[i].take().expect("each index is ordered exactly once"))
        .collect()
}

#[cfg(test)]
#[path = "sort_tests.rs"]
mod tests;
