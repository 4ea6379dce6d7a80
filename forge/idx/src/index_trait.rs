/// A handle that can be converted to and from a dense `usize` offset.
pub trait IndexRef: Copy + Eq {
    fn index(&self) -> usize;
    fn new(input: usize) -> Self;
}
