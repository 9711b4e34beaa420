//! Forward co-occurrence windows
//!
//! Every token is paired with the tokens that follow it within `radius` positions. Pairs point
//! forward (base precedes target), a word is never paired with itself, and sequences shorter
//! than `radius + 1` produce nothing.

/// Default number of following tokens considered related
pub const DEFAULT_RADIUS: usize = 5;

/// A forward window over a token sequence
#[derive(Debug, Clone, Copy)]
pub struct Window<'a, T: 'a> {
    items: &'a [T],
    radius: usize,
}

impl<'a, T: PartialEq + Copy> Window<'a, T> {
    pub fn new(items: &'a [T], radius: usize) -> Self {
        Window { items, radius }
    }

    /// All `(base, target)` pairs, in document order of the base
    pub fn pairs(&self) -> Pairs<'a, T> {
        let active = self.radius > 0 && self.items.len() > self.radius;
        Pairs {
            items: if active { self.items } else { &[] },
            radius: self.radius,
            base: 0,
            offset: 1,
        }
    }
}

/// Iterator behind `Window::pairs`
#[derive(Debug, Clone)]
pub struct Pairs<'a, T: 'a> {
    items: &'a [T],
    radius: usize,
    base: usize,
    offset: usize,
}

impl<'a, T: PartialEq + Copy> Iterator for Pairs<'a, T> {
    type Item = (T, T);

    fn next(&mut self) -> Option<(T, T)> {
        while self.base < self.items.len() {
            let target = self.base + self.offset;
            if self.offset > self.radius || target >= self.items.len() {
                self.base += 1;
                self.offset = 1;
                continue;
            }
            self.offset += 1;
            let (b, t) = (self.items[self.base], self.items[target]);
            if b != t {
                return Some((b, t));
            }
        }
        None
    }
}

/// Shorthand for `Window::new(items, radius).pairs().collect()`
pub fn pairs<T: PartialEq + Copy>(items: &[T], radius: usize) -> Vec<(T, T)> {
    Window::new(items, radius).pairs().collect()
}
