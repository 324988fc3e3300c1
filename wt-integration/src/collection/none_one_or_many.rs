use serde::{Deserialize, Serialize};

/// Nothing, one `T`, or many. Used for the engine's per-tick strategy
/// output (`on_tick` → zero, one, or several target-position changes)
/// where `None` is a distinct, meaningful outcome from `Many([])`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NoneOneOrMany<T> {
    #[default]
    None,
    One(T),
    Many(Vec<T>),
}

impl<T> NoneOneOrMany<T> {
    pub fn len(&self) -> usize {
        match self {
            NoneOneOrMany::None => 0,
            NoneOneOrMany::One(_) => 1,
            NoneOneOrMany::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, item: T) {
        *self = match std::mem::take(self) {
            NoneOneOrMany::None => NoneOneOrMany::One(item),
            NoneOneOrMany::One(existing) => NoneOneOrMany::Many(vec![existing, item]),
            NoneOneOrMany::Many(mut items) => {
                items.push(item);
                NoneOneOrMany::Many(items)
            }
        };
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            NoneOneOrMany::None => Vec::new(),
            NoneOneOrMany::One(item) => vec![item],
            NoneOneOrMany::Many(items) => items,
        }
    }
}

impl<T> FromIterator<T> for NoneOneOrMany<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut out = NoneOneOrMany::None;
        for item in iter {
            out.push(item);
        }
        out
    }
}

impl<T> IntoIterator for NoneOneOrMany<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}
