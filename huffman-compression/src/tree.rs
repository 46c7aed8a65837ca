use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use log::debug;

use crate::{
    cancel::CancellationToken,
    error::{HuffmanError, Result},
    frequency::FrequencyTable,
};

/// Which child of its parent a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Zero,
    One,
}

impl Side {
    pub fn bit(self) -> bool {
        matches!(self, Side::One)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    Leaf {
        symbol: u8,
        weight: usize,
    },
    Internal {
        left: Box<HuffmanNode>,
        right: Box<HuffmanNode>,
        weight: usize,
    },
}

impl HuffmanNode {
    pub fn weight(&self) -> usize {
        match self {
            HuffmanNode::Leaf { weight, .. } | HuffmanNode::Internal { weight, .. } => *weight,
        }
    }

    pub fn child(&self, side: Side) -> Option<&HuffmanNode> {
        match (self, side) {
            (HuffmanNode::Leaf { .. }, _) => None,
            (HuffmanNode::Internal { left, .. }, Side::Zero) => Some(left),
            (HuffmanNode::Internal { right, .. }, Side::One) => Some(right),
        }
    }

    // `left` takes side 0 and `right` side 1
    fn merge(left: HuffmanNode, right: HuffmanNode) -> Self {
        let weight = left.weight() + right.weight();
        HuffmanNode::Internal {
            left: Box::new(left),
            right: Box::new(right),
            weight,
        }
    }
}

/// Optimal prefix tree for one frequency table.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    root: HuffmanNode,
}

impl HuffmanTree {
    /// Runs the greedy merge over a min-heap until a single node is left.
    ///
    /// Ties between equal weights go to the node that entered the heap first.
    /// Leaves enter in ascending symbol order and merged nodes after them, so
    /// identical inputs always produce identical trees.
    pub fn build(frequencies: &FrequencyTable, cancel: &CancellationToken) -> Result<Self> {
        let trees = frequencies
            .iter()
            .map(|(symbol, weight)| HuffmanNode::Leaf { symbol, weight })
            .collect::<Trees>();

        let root = trees.merge(cancel)?.ok_or(HuffmanError::EmptyInput)?;
        debug!(
            "built tree of weight {} over {} symbols",
            root.weight(),
            frequencies.len()
        );
        Ok(Self { root })
    }

    pub fn root(&self) -> &HuffmanNode {
        &self.root
    }

    /// Total symbol count of the input the tree was built from.
    pub fn weight(&self) -> usize {
        self.root.weight()
    }

    /// Sum over the leaves of weight times depth, i.e. the encoded size in bits.
    /// A lone root leaf counts as depth 1 since it still gets a 1-bit code.
    pub fn weighted_path_length(&self) -> usize {
        fn walk(node: &HuffmanNode, depth: usize) -> usize {
            match node {
                HuffmanNode::Leaf { weight, .. } => weight * depth,
                HuffmanNode::Internal { left, right, .. } => {
                    walk(left, depth + 1) + walk(right, depth + 1)
                }
            }
        }

        match &self.root {
            HuffmanNode::Leaf { weight, .. } => *weight,
            root => walk(root, 0),
        }
    }
}

/// A heap entry, ordered by weight then by insertion sequence.
#[derive(Debug)]
struct Entry {
    sequence: usize,
    node: HuffmanNode,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.node
            .weight()
            .cmp(&other.node.weight())
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Entry {}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

#[derive(Default)]
struct Trees {
    heap: BinaryHeap<Reverse<Entry>>,
    next_sequence: usize,
}

impl FromIterator<HuffmanNode> for Trees {
    fn from_iter<T: IntoIterator<Item = HuffmanNode>>(iter: T) -> Self {
        let mut trees = Trees::default();
        iter.into_iter().for_each(|node| trees.insert(node));
        trees
    }
}

impl Trees {
    fn merge(mut self, cancel: &CancellationToken) -> Result<Option<HuffmanNode>> {
        loop {
            cancel.check()?;
            let Some(result) = self.pop_lowest() else {
                return Ok(None);
            };
            match result {
                PopResult::TreesToMerge { left, right } => {
                    self.insert(HuffmanNode::merge(left, right));
                }
                PopResult::Single(tree) => {
                    return Ok(Some(tree));
                }
            }
        }
    }

    fn pop_lowest(&mut self) -> Option<PopResult> {
        let Reverse(left) = self.heap.pop()?;

        let item_result = match self.heap.pop() {
            Some(Reverse(right)) => PopResult::TreesToMerge {
                left: left.node,
                right: right.node,
            },
            None => PopResult::Single(left.node),
        };

        Some(item_result)
    }

    fn insert(&mut self, node: HuffmanNode) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Reverse(Entry { sequence, node }));
    }
}

enum PopResult {
    TreesToMerge {
        left: HuffmanNode,
        right: HuffmanNode,
    },
    Single(HuffmanNode),
}

#[cfg(test)]
mod tests {
    use super::{HuffmanNode, HuffmanTree, Side};
    use crate::{cancel::CancellationToken, error::HuffmanError, frequency::FrequencyTable};

    fn build(counts: &[(u8, usize)]) -> HuffmanTree {
        let frequencies = counts.iter().copied().collect::<FrequencyTable>();
        HuffmanTree::build(&frequencies, &CancellationToken::new()).unwrap()
    }

    fn assert_weights_add_up(node: &HuffmanNode) {
        if let HuffmanNode::Internal {
            left,
            right,
            weight,
        } = node
        {
            assert_eq!(*weight, left.weight() + right.weight());
            assert_weights_add_up(left);
            assert_weights_add_up(right);
        }
    }

    #[test]
    fn test_merging() {
        // char_mapping test data comes from
        // https://opendsa-server.cs.vt.edu/ODSA/Books/CS3/html/Huffman.html
        let char_mapping = [
            (b'C', 32),
            (b'D', 42),
            (b'E', 120),
            (b'K', 7),
            (b'L', 42),
            (b'M', 24),
            (b'U', 37),
            (b'Z', 2),
        ];

        let tree = build(&char_mapping);

        assert_eq!(tree.weight(), 306);
        assert_eq!(tree.weighted_path_length(), 785);
        assert_weights_add_up(tree.root());
    }

    #[test]
    fn test_earlier_node_wins_ties() {
        let tree = build(&[(b'a', 3), (b'b', 2), (b'c', 1)]);

        // c and b merge into a node of weight 3, which entered after a
        let left = tree.root().child(Side::Zero).unwrap();
        let right = tree.root().child(Side::One).unwrap();
        assert_eq!(
            left,
            &HuffmanNode::Leaf {
                symbol: b'a',
                weight: 3
            }
        );
        assert_eq!(right.weight(), 3);
        assert_eq!(
            right.child(Side::Zero),
            Some(&HuffmanNode::Leaf {
                symbol: b'c',
                weight: 1
            })
        );
        assert_eq!(tree.weighted_path_length(), 9);
    }

    #[test]
    fn test_single_symbol_is_a_lone_leaf() {
        let tree = build(&[(b'x', 5)]);

        assert_eq!(
            tree.root(),
            &HuffmanNode::Leaf {
                symbol: b'x',
                weight: 5
            }
        );
        assert_eq!(tree.root().child(Side::Zero), None);
        assert_eq!(tree.weighted_path_length(), 5);
    }

    #[test]
    fn test_empty_table() {
        let frequencies = FrequencyTable::from_iter(Vec::<(u8, usize)>::new());
        let result = HuffmanTree::build(&frequencies, &CancellationToken::new());
        assert!(matches!(result, Err(HuffmanError::EmptyInput)));
    }

    #[test]
    fn test_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let frequencies = FrequencyTable::from_iter([(b'a', 1), (b'b', 1)]);
        let result = HuffmanTree::build(&frequencies, &cancel);
        assert!(matches!(result, Err(HuffmanError::Cancelled)));
    }
}
