use crate::side::Side;
use core::ops::{Index, IndexMut};
use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// One value per side of the board
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhiteBlackBundle<T> {
    pub white: T,
    pub black: T,
}

impl<T> WhiteBlackBundle<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        self.into_iter()
    }
}

impl<T: Clone> WhiteBlackBundle<T> {
    pub fn splat(value: T) -> Self {
        Self {
            white: value.clone(),
            black: value,
        }
    }
}

impl<T> Index<Side> for WhiteBlackBundle<T> {
    type Output = T;

    fn index(&self, side: Side) -> &Self::Output {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}

impl<T> IndexMut<Side> for WhiteBlackBundle<T> {
    fn index_mut(&mut self, side: Side) -> &mut Self::Output {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}

pub struct WhiteBlackBundleIterator<'a, T> {
    bundle: &'a WhiteBlackBundle<T>,
    index: usize,
}

impl<'a, T> Iterator for WhiteBlackBundleIterator<'a, T> {
    type Item = (Side, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.index {
            0 => (Side::White, &self.bundle.white),
            1 => (Side::Black, &self.bundle.black),
            _ => return None,
        };

        self.index += 1;
        Some(value)
    }
}

impl<'a, T> IntoIterator for &'a WhiteBlackBundle<T> {
    type Item = (Side, &'a T);
    type IntoIter = WhiteBlackBundleIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        WhiteBlackBundleIterator {
            bundle: self,
            index: 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_index_by_side() {
        let mut bundle = WhiteBlackBundle::splat(1u8);
        bundle[Side::Black] += 5;
        assert_eq!(bundle[Side::White], 1);
        assert_eq!(bundle[Side::Black], 6);
        assert_eq!(bundle.black, 6);
    }

    #[test]
    fn test_iter_order() {
        let bundle = WhiteBlackBundle {
            white: "w",
            black: "b",
        };
        let items: Vec<_> = bundle.iter().map(|(s, v)| (s, *v)).collect();
        assert_eq!(items, vec![(Side::White, "w"), (Side::Black, "b")]);
    }
}
