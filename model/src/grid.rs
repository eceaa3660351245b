use std::ops::{Index, IndexMut};

use serde::Serialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    /// Column-major 2d, blocks of a single columns (increasing y) are stored sequentially.
    inner: Vec<T>,
}

impl<T> Grid<T> {
    pub fn new(inner: Vec<T>, width: usize, height: usize) -> Grid<T> {
        debug_assert_eq!(width * height, inner.len());
        Grid {
            inner,
            width,
            height,
        }
    }

    pub fn fill_with_clone(item: T, width: usize, height: usize) -> Grid<T>
    where
        T: Clone,
    {
        Grid {
            inner: vec![item; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether `(x, y)` lies within `[0, width) x [0, height)`.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn offset(&self, x: i32, y: i32) -> Result<usize> {
        if !self.contains(x, y) {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        Ok(x as usize * self.height + y as usize)
    }

    /// Bounds checked lookup, coordinates outside of the grid are an error rather than clamped.
    pub fn get(&self, x: i32, y: i32) -> Result<&T> {
        let offset = self.offset(x, y)?;
        Ok(&self.inner[offset])
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Result<&mut T> {
        let offset = self.offset(x, y)?;
        Ok(&mut self.inner[offset])
    }

    /// Iterates over every cell along with its coordinates, column by column.
    pub fn iter_column_major(&self) -> impl Iterator<Item = ((i32, i32), &T)> {
        let height = self.height;
        self.inner
            .iter()
            .enumerate()
            .map(move |(i, item)| (((i / height) as i32, (i % height) as i32), item))
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.width * self.height, self.inner.len());
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> Index<usize> for Grid<T> {
    type Output = [T];

    fn index(&self, x: usize) -> &Self::Output {
        let start = x * self.height;
        &self.inner[start..start + self.height]
    }
}

impl<T> IndexMut<usize> for Grid<T> {
    fn index_mut(&mut self, x: usize) -> &mut Self::Output {
        let start = x * self.height;
        &mut self.inner[start..start + self.height]
    }
}

impl<T> AsRef<[T]> for Grid<T> {
    fn as_ref(&self) -> &[T] {
        &self.inner
    }
}
