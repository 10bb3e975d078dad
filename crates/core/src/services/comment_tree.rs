//! Comment tree construction.
//!
//! Comments are stored flat with a nullable `parent_id`. The tree is built
//! without recursion: nodes are visited breadth-first from the roots to fix
//! every node's (depth-capped) parent, then assembled bottom-up in reverse
//! visit order so each node's replies are complete before it is moved into
//! its parent.

use std::collections::{HashMap, VecDeque};

use pitchboard_db::entities::comment;
use serde::Serialize;

/// Deepest reply level kept in the output. Top-level comments are depth 0.
///
/// A reply that would land deeper is attached to its ancestor at depth
/// `MAX_REPLY_DEPTH - 1`, so it shows up at the last level instead of being
/// dropped.
pub const MAX_REPLY_DEPTH: usize = 64;

/// A comment with its replies, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Find the node with `id` in this subtree.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Self> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.comment.id == id {
                return Some(node);
            }
            stack.extend(node.replies.iter());
        }
        None
    }

    /// Number of nodes in this subtree, including itself.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

/// Build the comment forest of one project.
///
/// `comments` should be ordered by `(created_at, id)`; that order is kept
/// among siblings. A comment whose parent is not in the list is treated as
/// top-level.
#[must_use]
pub fn build_comment_tree(comments: Vec<comment::Model>) -> Vec<CommentNode> {
    let n = comments.len();
    if n == 0 {
        return Vec::new();
    }

    let index: HashMap<&str, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let parent: Vec<Option<usize>> = comments
        .iter()
        .map(|c| {
            c.parent_id
                .as_deref()
                .and_then(|p| index.get(p).copied())
        })
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, p) in parent.iter().enumerate() {
        if let Some(p) = *p {
            children[p].push(i);
        }
    }

    // Breadth-first pass: fix the effective parent and depth of every node.
    let mut effective_parent: Vec<Option<usize>> = vec![None; n];
    let mut depth = vec![0usize; n];
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut roots = Vec::new();

    // Real roots first; the second pass only picks up nodes stuck in a
    // parent cycle, which then become roots themselves.
    let starts = (0..n).filter(|&i| parent[i].is_none()).chain(0..n);
    for start in starts {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        roots.push(start);

        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            order.push(u);
            for &child in &children[u] {
                if visited[child] {
                    continue;
                }
                visited[child] = true;

                if depth[u] < MAX_REPLY_DEPTH {
                    effective_parent[child] = Some(u);
                    depth[child] = depth[u] + 1;
                } else {
                    effective_parent[child] = effective_parent[u];
                    depth[child] = MAX_REPLY_DEPTH;
                }
                queue.push_back(child);
            }
        }
    }

    let mut replies: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, p) in effective_parent.iter().enumerate() {
        if let Some(p) = *p {
            replies[p].push(i);
        }
    }

    // Bottom-up assembly: in reverse BFS order every reply is finished
    // before its parent is.
    let mut slots: Vec<Option<comment::Model>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = vec![None; n];
    for &u in order.iter().rev() {
        let node_replies = replies[u]
            .iter()
            .filter_map(|&r| built[r].take())
            .collect();
        if let Some(comment) = slots[u].take() {
            built[u] = Some(CommentNode {
                comment,
                replies: node_replies,
            });
        }
    }

    roots.sort_unstable();
    roots.into_iter().filter_map(|r| built[r].take()).collect()
}
