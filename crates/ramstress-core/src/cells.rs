//! Byte-addressable test surface.
//!
//! Every pattern test is written against [`Cells`] rather than `[u8]`, so
//! the same algorithms drive real segments in production and faulty memory
//! models in tests. Reads and writes on real memory are volatile: the
//! optimiser may not fold a verify pass into the fill that preceded it.

use crate::patterns::TestKind;
use crate::segment::Segment;

/// Memory under test.
pub trait Cells: Send {
    /// Size in bytes.
    fn len(&self) -> usize;

    /// True when there are no bytes to test.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the byte at `offset`.
    fn read(&self, offset: usize) -> u8;

    /// Write `value` at `offset`.
    fn write(&mut self, offset: usize, value: u8);

    /// Write `value` to every byte, ascending.
    fn fill(&mut self, value: u8) {
        for offset in 0..self.len() {
            self.write(offset, value);
        }
    }

    /// Copy `[0, len/2)` over `[len/2, 2*(len/2))`.
    fn copy_lower_half_to_upper(&mut self) {
        let half = self.len() / 2;
        for offset in 0..half {
            let value = self.read(offset);
            self.write(half + offset, value);
        }
    }

    /// Called before each step of the battery runs on this memory.
    fn begin(&mut self, _test: TestKind) {}
}

impl Cells for [u8] {
    #[inline]
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    #[inline]
    fn read(&self, offset: usize) -> u8 {
        let cell = &self[offset];
        // SAFETY: `cell` is a valid, aligned reference into the slice.
        unsafe { std::ptr::read_volatile(cell) }
    }

    #[inline]
    fn write(&mut self, offset: usize, value: u8) {
        let cell = &mut self[offset];
        // SAFETY: `cell` is a valid, aligned, unique reference into the slice.
        unsafe { std::ptr::write_volatile(cell, value) }
    }

    fn fill(&mut self, value: u8) {
        <[u8]>::fill(self, value);
    }

    fn copy_lower_half_to_upper(&mut self) {
        let half = <[u8]>::len(self) / 2;
        self.copy_within(0..half, half);
    }
}

impl Cells for Vec<u8> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn read(&self, offset: usize) -> u8 {
        Cells::read(self.as_slice(), offset)
    }

    fn write(&mut self, offset: usize, value: u8) {
        Cells::write(self.as_mut_slice(), offset, value);
    }

    fn fill(&mut self, value: u8) {
        Cells::fill(self.as_mut_slice(), value);
    }

    fn copy_lower_half_to_upper(&mut self) {
        Cells::copy_lower_half_to_upper(self.as_mut_slice());
    }
}

impl Cells for Segment {
    fn len(&self) -> usize {
        Segment::len(self)
    }

    fn read(&self, offset: usize) -> u8 {
        Cells::read(self.as_slice(), offset)
    }

    fn write(&mut self, offset: usize, value: u8) {
        Cells::write(self.as_mut_slice(), offset, value);
    }

    fn fill(&mut self, value: u8) {
        Cells::fill(self.as_mut_slice(), value);
    }

    fn copy_lower_half_to_upper(&mut self) {
        Cells::copy_lower_half_to_upper(self.as_mut_slice());
    }
}
