//! Passphrase callback contract.
//!
//! A codec that needs a passphrase hands the caller a [`PassphraseBuf`] over
//! storage it owns, a [`Direction`], and the caller's opaque user data. The
//! callback writes at most `capacity` bytes and returns an `i32`:
//!
//! - `> 0`: number of passphrase bytes written (a value above capacity is an
//!   over-claim the codec must reject)
//! - `0`: an explicit empty passphrase
//! - `< 0`: the callback declines to supply a passphrase
//!
//! The buffer view exposes no way to write past its capacity: every write path
//! is either bounds-checked by slice indexing or refuses oversized input.

use std::fmt;

use zeroize::Zeroizing;

/// Capacity of the buffer a codec offers to the callback, in bytes.
pub const PASSPHRASE_CAPACITY: usize = 1024;

/// Whether the passphrase is being requested to encrypt or to decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Decoding an existing container.
    Reading,
    /// Producing a new container.
    Writing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Reading => write!(f, "reading"),
            Direction::Writing => write!(f, "writing"),
        }
    }
}

/// A bounded, writable view over codec-owned passphrase storage.
pub struct PassphraseBuf<'a> {
    bytes: &'a mut [u8],
}

impl<'a> PassphraseBuf<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    /// Number of bytes the callback may write.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Mutable access to exactly `capacity` bytes.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.bytes
    }

    /// Overwrite the whole buffer with `byte`.
    pub fn fill(&mut self, byte: u8) {
        self.bytes.fill(byte);
    }

    /// Copy `src` to the start of the buffer.
    ///
    /// Returns the number of bytes written, or `None` (leaving the buffer
    /// untouched) when `src` does not fit.
    pub fn write_prefix(&mut self, src: &[u8]) -> Option<usize> {
        let dst = self.bytes.get_mut(..src.len())?;
        dst.copy_from_slice(src);
        Some(src.len())
    }
}

impl fmt::Debug for PassphraseBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassphraseBuf")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// Supplies passphrase bytes to a codec on demand.
///
/// `U` is the caller's context; the codec passes it through untouched.
pub trait PassphraseCallback<U: ?Sized> {
    fn request(&mut self, buf: &mut PassphraseBuf<'_>, direction: Direction, user_data: &U)
        -> i32;
}

impl<U, F> PassphraseCallback<U> for F
where
    U: ?Sized,
    F: FnMut(&mut PassphraseBuf<'_>, Direction, &U) -> i32,
{
    fn request(
        &mut self,
        buf: &mut PassphraseBuf<'_>,
        direction: Direction,
        user_data: &U,
    ) -> i32 {
        self(buf, direction, user_data)
    }
}

/// Passphrase bytes accepted by a codec. Compared byte-for-byte; zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(Zeroizing<Vec<u8>>);

impl Passphrase {
    pub fn new(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passphrase({} bytes)", self.len())
    }
}
