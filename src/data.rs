//! Borrowed and owned byte regions.

use std::fmt;

use zeroize::Zeroize;

/// A borrowed view of contiguous elements. Never frees anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buffer<'a, T = u8> {
    data: &'a [T],
}

impl<'a, T> Buffer<'a, T> {
    pub fn new(data: &'a [T]) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &'a [T] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<'a, T> From<&'a [T]> for Buffer<'a, T> {
    fn from(data: &'a [T]) -> Self {
        Self { data }
    }
}

impl<'a, T, const N: usize> From<&'a [T; N]> for Buffer<'a, T> {
    fn from(data: &'a [T; N]) -> Self {
        Self { data }
    }
}

impl<'a> From<&'a str> for Buffer<'a, u8> {
    fn from(s: &'a str) -> Self {
        Self {
            data: s.as_bytes(),
        }
    }
}

impl<'a> From<&'a Vec<u8>> for Buffer<'a, u8> {
    fn from(v: &'a Vec<u8>) -> Self {
        Self { data: v.as_slice() }
    }
}

/// An owned byte region, zeroized before it is freed.
///
/// A `DataPointer` that owns nothing is *null*; one that owns a zero-length
/// region is merely *empty*.
#[derive(Default, PartialEq, Eq)]
pub struct DataPointer {
    data: Option<Box<[u8]>>,
}

impl DataPointer {
    /// A null pointer.
    pub fn null() -> Self {
        Self { data: None }
    }

    /// A zero-filled region of `len` bytes. `alloc(0)` is empty, not null.
    pub fn alloc(len: usize) -> Self {
        Self {
            data: Some(vec![0u8; len].into_boxed_slice()),
        }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data: Some(data.into_boxed_slice()),
        }
    }

    pub fn from_buffer(buffer: Buffer<'_, u8>) -> Self {
        Self::from_vec(buffer.data().to_vec())
    }

    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    pub fn as_buffer(&self) -> Buffer<'_, u8> {
        Buffer::new(self.as_slice())
    }

    /// Frees the current region and takes ownership of `data`.
    pub fn reset(&mut self, data: Option<Vec<u8>>) {
        self.wipe();
        self.data = data.map(Vec::into_boxed_slice);
    }

    /// Hands the region to the caller without freeing it.
    pub fn release(&mut self) -> Option<Box<[u8]>> {
        self.data.take()
    }

    /// Moves ownership into a new pointer, leaving this one null.
    pub fn take(&mut self) -> DataPointer {
        DataPointer {
            data: self.data.take(),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    fn wipe(&mut self) {
        if let Some(data) = self.data.as_deref_mut() {
            data.zeroize();
        }
    }
}

impl Drop for DataPointer {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl From<Vec<u8>> for DataPointer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<String> for DataPointer {
    fn from(s: String) -> Self {
        Self::from_vec(s.into_bytes())
    }
}

impl AsRef<[u8]> for DataPointer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for DataPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(d) => f.debug_struct("DataPointer").field("len", &d.len()).finish(),
            None => f.write_str("DataPointer(null)"),
        }
    }
}
