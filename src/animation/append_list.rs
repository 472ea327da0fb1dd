//! Lazy concatenation list.
//!
//! Appending is O(1) and builds a tree; the tree is flattened only when the
//! list is enumerated with [`AppendList::to_vec`].

use std::rc::Rc;

use crate::types::tree_reduce;

#[derive(Debug, Clone)]
pub enum AppendList<T> {
    Empty,
    Single(T),
    Append(Rc<AppendList<T>>, Rc<AppendList<T>>),
    FromArray(Rc<[T]>),
}

impl<T> Default for AppendList<T> {
    fn default() -> Self {
        AppendList::Empty
    }
}

impl<T: Clone> AppendList<T> {
    pub fn empty() -> Self {
        AppendList::Empty
    }

    pub fn single(x: T) -> Self {
        AppendList::Single(x)
    }

    pub fn from_vec(xs: Vec<T>) -> Self {
        match xs.len() {
            0 => AppendList::Empty,
            _ => AppendList::FromArray(xs.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AppendList::Empty)
    }

    /// Concatenate; an empty side is skipped.
    pub fn append(&self, other: &AppendList<T>) -> Self {
        match (self, other) {
            (AppendList::Empty, _) => other.clone(),
            (_, AppendList::Empty) => self.clone(),
            _ => AppendList::Append(Rc::new(self.clone()), Rc::new(other.clone())),
        }
    }

    /// Concatenate many lists as a balanced tree.
    pub fn concat(lists: impl IntoIterator<Item = AppendList<T>>) -> Self {
        let lists: Vec<AppendList<T>> = lists.into_iter().collect();
        tree_reduce(AppendList::Empty, &lists, &|a, b| a.append(b))
    }

    /// Flatten in order.
    pub fn to_vec(&self) -> Vec<T> {
        fn walk<T: Clone>(list: &AppendList<T>, out: &mut Vec<T>) {
            match list {
                AppendList::Empty => {}
                AppendList::Single(x) => out.push(x.clone()),
                AppendList::Append(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
                AppendList::FromArray(xs) => out.extend(xs.iter().cloned()),
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_skips_empty() {
        let a = AppendList::single(1);
        assert!(matches!(a.append(&AppendList::empty()), AppendList::Single(1)));
        assert!(matches!(AppendList::empty().append(&a), AppendList::Single(1)));
    }

    #[test]
    fn test_concat_flattens_in_order() {
        let lists = vec![
            AppendList::single(1),
            AppendList::empty(),
            AppendList::from_vec(vec![2, 3]),
            AppendList::single(4).append(&AppendList::single(5)),
        ];
        assert_eq!(AppendList::concat(lists).to_vec(), vec![1, 2, 3, 4, 5]);
        assert!(AppendList::<i32>::concat(Vec::new()).is_empty());
    }
}
