//! Sender side of a paged transfer.
//!
//! A [`SenderChunkPackage`] holds one serialized payload and serves it as a
//! sequence of fixed-size pages, either in order through an internal cursor
//! or by page index.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::codec::PayloadSerializer;
use crate::error::{CoreError, Result};

/// A serialized payload split into pages of `chunk_size` bytes.
///
/// Page indices run from `0` to `total_pages()` inclusive, where
/// `total_pages = len / chunk_size`. The page at `total_pages` holds the
/// remainder and is empty when the length divides evenly.
///
/// The cursor makes this a single-writer type: concurrent callers of
/// [`get_data_at_page`](Self::get_data_at_page) are fine, but
/// [`get_next_page`](Self::get_next_page) needs exclusive access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderChunkPackage {
    data: Bytes,
    chunk_size: usize,
    cursor: usize,
    total_pages: usize,
}

impl SenderChunkPackage {
    /// Wrap already-serialized bytes.
    pub fn new(data: impl Into<Bytes>, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(CoreError::InvalidChunkSize(chunk_size));
        }
        let data = data.into();
        let total_pages = data.len() / chunk_size;
        Ok(Self {
            data,
            chunk_size,
            cursor: 0,
            total_pages,
        })
    }

    /// Serialize a payload and wrap it.
    pub fn from_payload<T, S>(serializer: &S, payload: &T, chunk_size: usize) -> Result<Self>
    where
        T: Serialize + ?Sized,
        S: PayloadSerializer,
    {
        let data = serializer.serialize(payload)?;
        Self::new(data, chunk_size)
    }

    /// Re-initialize with a new payload, discarding all prior state.
    pub fn initialize<T, S>(&mut self, serializer: &S, payload: &T, chunk_size: usize) -> Result<()>
    where
        T: Serialize + ?Sized,
        S: PayloadSerializer,
    {
        *self = Self::from_payload(serializer, payload, chunk_size)?;
        Ok(())
    }

    /// Return the page under the cursor and advance it.
    ///
    /// The cursor only moves when a page is returned.
    pub fn get_next_page(&mut self) -> Option<Bytes> {
        let page = self.get_data_at_page(self.cursor)?;
        self.cursor += 1;
        Some(page)
    }

    /// Return page `page` without touching the cursor.
    ///
    /// `None` for any index past `total_pages()`.
    pub fn get_data_at_page(&self, page: usize) -> Option<Bytes> {
        if page > self.total_pages {
            return None;
        }
        let offset = page * self.chunk_size;
        let len = self.chunk_size.min(self.data.len() - offset);
        Some(self.data.slice(offset..offset + len))
    }

    /// Length of the serialized payload.
    pub fn total_length(&self) -> usize {
        self.data.len()
    }

    /// Index of the last servable page (the remainder page).
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Index of the next page `get_next_page` will return.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The full serialized payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CborSerializer;
    use proptest::prelude::*;

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            SenderChunkPackage::new(vec![1u8, 2, 3], 0),
            Err(CoreError::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn test_pages_with_remainder() {
        let pkg = SenderChunkPackage::new((0u8..10).collect::<Vec<_>>(), 4).unwrap();
        assert_eq!(pkg.total_pages(), 2);
        assert_eq!(&pkg.get_data_at_page(0).unwrap()[..], &[0, 1, 2, 3]);
        assert_eq!(&pkg.get_data_at_page(1).unwrap()[..], &[4, 5, 6, 7]);
        assert_eq!(&pkg.get_data_at_page(2).unwrap()[..], &[8, 9]);
        assert!(pkg.get_data_at_page(3).is_none());
    }

    #[test]
    fn test_even_division_serves_empty_last_page() {
        let pkg = SenderChunkPackage::new(vec![7u8; 12], 4).unwrap();
        assert_eq!(pkg.total_pages(), 3);
        assert_eq!(pkg.get_data_at_page(2).unwrap().len(), 4);

        let last = pkg.get_data_at_page(3).unwrap();
        assert!(last.is_empty());
        assert!(pkg.get_data_at_page(4).is_none());
    }

    #[test]
    fn test_empty_payload() {
        let mut pkg = SenderChunkPackage::new(Vec::<u8>::new(), 16).unwrap();
        assert_eq!(pkg.total_pages(), 0);
        assert!(pkg.get_next_page().unwrap().is_empty());
        assert!(pkg.get_next_page().is_none());
    }

    #[test]
    fn test_cursor_advances_only_on_success() {
        let mut pkg = SenderChunkPackage::new(vec![1u8; 5], 2).unwrap();
        let mut pages = 0;
        while pkg.get_next_page().is_some() {
            pages += 1;
        }
        assert_eq!(pages, 3);
        assert_eq!(pkg.cursor(), 3);

        assert!(pkg.get_next_page().is_none());
        assert_eq!(pkg.cursor(), 3);
    }

    #[test]
    fn test_random_access_leaves_cursor() {
        let mut pkg = SenderChunkPackage::new(vec![1u8; 5], 2).unwrap();
        pkg.get_data_at_page(2).unwrap();
        assert_eq!(pkg.cursor(), 0);
        pkg.get_next_page().unwrap();
        assert_eq!(pkg.cursor(), 1);
    }

    #[test]
    fn test_initialize_overwrites_state() {
        let mut pkg = SenderChunkPackage::new(vec![1u8; 100], 10).unwrap();
        pkg.get_next_page().unwrap();
        pkg.get_next_page().unwrap();

        pkg.initialize(&CborSerializer, &"short", 3).unwrap();
        assert_eq!(pkg.cursor(), 0);
        assert_eq!(pkg.chunk_size(), 3);
        assert_eq!(pkg.total_length(), 6); // text header byte + 5 chars
        assert_eq!(pkg.total_pages(), 2);
    }

    #[test]
    fn test_million_integers_boundary_page() {
        let original: Vec<i32> = (0..1_000_000).collect();
        let chunk = 100_000;
        let pkg = SenderChunkPackage::from_payload(&CborSerializer, &original, chunk).unwrap();

        let total = pkg.total_length();
        assert_ne!(total % chunk, 0);
        assert_eq!(pkg.total_pages(), total / chunk);

        let last = pkg.get_data_at_page(pkg.total_pages()).unwrap();
        assert_eq!(last.len(), total - pkg.total_pages() * chunk);
        assert!(pkg.get_data_at_page(pkg.total_pages() + 1).is_none());
    }

    proptest! {
        #[test]
        fn test_pages_concatenate_to_payload(
            data in prop::collection::vec(any::<u8>(), 0..4096),
            chunk_size in 1usize..512,
        ) {
            let mut pkg = SenderChunkPackage::new(data.clone(), chunk_size).unwrap();
            let mut joined = Vec::new();
            while let Some(page) = pkg.get_next_page() {
                prop_assert!(page.len() <= chunk_size);
                joined.extend_from_slice(&page);
            }
            prop_assert_eq!(joined, data);
            prop_assert_eq!(pkg.cursor(), pkg.total_pages() + 1);
        }
    }
}
