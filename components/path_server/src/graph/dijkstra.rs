use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::Hash;

/// A path from the source to some node.
/// Paths are ordered by cost, then by amount of hops, then by the sequence of hops.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Label<N, E> {
    cost: u128,
    /// (node, edge used to reach node)
    path: Vec<(N, E)>,
}

impl<N: Ord, E: Ord> Ord for Label<N, E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.path.len().cmp(&other.path.len()))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl<N: Ord, E: Ord> PartialOrd for Label<N, E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, PartialEq, Eq)]
struct QueueEntry<N, E> {
    node: N,
    label: Label<N, E>,
}

// Reversed, so that `BinaryHeap` pops the smallest label first.
impl<N: Ord, E: Ord> Ord for QueueEntry<N, E> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .label
            .cmp(&self.label)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<N: Ord, E: Ord> PartialOrd for QueueEntry<N, E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest path from `src` to `dst`.
///
/// `get_edges(node, cost)` returns the edges leaving `node` as `(edge, neighbor, weight)`, where
/// `cost` is the cost of the best path reaching `node`. Weights may depend on `cost`, as long as
/// `cost + weight` does not decrease when `cost` grows.
/// Ties are broken by fewer hops, and then by the smaller sequence of hops.
/// On success returns the total cost and the hops of the path, each hop being the reached node
/// and the edge used to reach it.
pub fn dijkstra<N, E, F, ER>(
    src: &N,
    dst: &N,
    mut get_edges: F,
) -> Result<Option<(u128, Vec<(N, E)>)>, ER>
where
    N: Clone + Ord + Hash,
    E: Clone + Ord,
    F: FnMut(&N, u128) -> Result<Vec<(E, N, u128)>, ER>,
{
    let mut best: HashMap<N, Label<N, E>> = HashMap::new();
    let mut visited: HashSet<N> = HashSet::new();
    let mut queue: BinaryHeap<QueueEntry<N, E>> = BinaryHeap::new();

    let start = Label {
        cost: 0,
        path: Vec::new(),
    };
    best.insert(src.clone(), start.clone());
    queue.push(QueueEntry {
        node: src.clone(),
        label: start,
    });

    while let Some(QueueEntry { node, label }) = queue.pop() {
        if visited.contains(&node) {
            continue;
        }
        if &node == dst {
            return Ok(Some((label.cost, label.path)));
        }
        visited.insert(node.clone());

        for (edge, neighbor, weight) in get_edges(&node, label.cost)? {
            if visited.contains(&neighbor) {
                continue;
            }
            let cost = match label.cost.checked_add(weight) {
                Some(cost) => cost,
                None => continue,
            };
            let mut path = label.path.clone();
            path.push((neighbor.clone(), edge));
            let new_label = Label { cost, path };

            let is_better = match best.get(&neighbor) {
                Some(cur_label) => new_label < *cur_label,
                None => true,
            };
            if is_better {
                best.insert(neighbor.clone(), new_label.clone());
                queue.push(QueueEntry {
                    node: neighbor,
                    label: new_label,
                });
            }
        }
    }
    Ok(None)
}
