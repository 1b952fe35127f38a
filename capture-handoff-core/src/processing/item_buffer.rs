use std::collections::vec_deque;
use std::collections::VecDeque;

use crate::models::config::OverflowPolicy;
use crate::models::item::Item;

/// Ordered, appendable container of items; the unit swapped between the
/// producer and the consumer.
///
/// A buffer is either live (receiving appends under the queue lock) or
/// drained (owned by the consumer and only iterated). Items keep arrival
/// order in both roles.
#[derive(Debug, Default)]
pub struct ItemBuffer {
    items: VecDeque<Item>,
}

impl ItemBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail. Unbounded.
    pub fn push(&mut self, item: Item) {
        self.items.push_back(item);
    }

    /// Append with a size limit.
    ///
    /// Returns the item that did not make it: the arriving one under
    /// `DropNewest`, the evicted head under `DropOldest`, or None if the
    /// buffer had room.
    pub fn push_bounded(&mut self, item: Item, limit: usize, policy: OverflowPolicy) -> Option<Item> {
        if self.items.len() < limit {
            self.items.push_back(item);
            return None;
        }
        match policy {
            OverflowPolicy::DropNewest => Some(item),
            OverflowPolicy::DropOldest => match self.items.pop_front() {
                Some(evicted) => {
                    self.items.push_back(item);
                    Some(evicted)
                }
                // A zero limit leaves nothing to evict; the arrival is refused.
                None => Some(item),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Item> {
        self.items.iter()
    }

    /// Sequence numbers in buffer order.
    pub fn seqs(&self) -> Vec<u64> {
        self.items.iter().map(Item::seq).collect()
    }
}

impl IntoIterator for ItemBuffer {
    type Item = Item;
    type IntoIter = vec_deque::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ItemBuffer {
    type Item = &'a Item;
    type IntoIter = vec_deque::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Item> for ItemBuffer {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
