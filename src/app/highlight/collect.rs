use std::collections::{HashSet, VecDeque};

/// Breadth-first walk along `adjacency` from `start`, up to `max_depth` hops. `forward` tells
/// whether adjacency lists point from source to target, so recorded edges keep their direction.
pub(super) fn collect_neighborhood(
    adjacency: &[Vec<usize>],
    start: usize,
    forward: bool,
    max_depth: usize,
    nodes: &mut HashSet<usize>,
    edges: &mut HashSet<(usize, usize)>,
) {
    const NODE_LIMIT: usize = 280;

    if start >= adjacency.len() {
        return;
    }

    let mut queue = VecDeque::from([(start, 0usize)]);
    let mut visited = HashSet::from([start]);

    while let Some((index, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }

        for &next in &adjacency[index] {
            edges.insert(if forward { (index, next) } else { (next, index) });
            if next != start {
                nodes.insert(next);
            }
            if nodes.len() >= NODE_LIMIT {
                return;
            }
            if visited.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_limited_depth_in_edge_direction() {
        // 0 -> 1 -> 2 -> 3, and 4 -> 0
        let outgoing = vec![vec![1], vec![2], vec![3], vec![], vec![0]];
        let incoming = vec![vec![4], vec![0], vec![1], vec![2], vec![]];

        let mut down = HashSet::new();
        let mut edges = HashSet::new();
        collect_neighborhood(&outgoing, 0, true, 2, &mut down, &mut edges);
        assert_eq!(down, HashSet::from([1, 2]));
        assert_eq!(edges, HashSet::from([(0, 1), (1, 2)]));

        let mut up = HashSet::new();
        collect_neighborhood(&incoming, 0, false, 2, &mut up, &mut edges);
        assert_eq!(up, HashSet::from([4]));
        assert!(edges.contains(&(4, 0)));
    }
}
