//! Buffer frame management.

use quarry_common::PageId;
use std::sync::Arc;

/// Unique identifier for a frame in the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u32);

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame:{}", self.0)
    }
}

/// A slot in the buffer pool holding at most one decoded page.
///
/// Pages are handed out as `Arc<P>`; a frame counts as pinned for as long
/// as any caller still holds a clone of its page.
pub struct BufferFrame<P> {
    frame_id: FrameId,
    resident: Option<(PageId, Arc<P>)>,
}

impl<P> BufferFrame<P> {
    /// Creates a new empty buffer frame.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            resident: None,
        }
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page ID currently stored in this frame.
    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        self.resident.as_ref().map(|(page_id, _)| *page_id)
    }

    /// Returns a new handle to the resident page.
    #[inline]
    pub fn page(&self) -> Option<Arc<P>> {
        self.resident.as_ref().map(|(_, page)| Arc::clone(page))
    }

    /// Returns true while some caller outside the pool holds the page.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.resident
            .as_ref()
            .is_some_and(|(_, page)| Arc::strong_count(page) > 1)
    }

    /// Returns true if this frame is empty (no page loaded).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resident.is_none()
    }

    /// Places a page in the frame, returning whatever was there before.
    pub fn install(&mut self, page_id: PageId, page: Arc<P>) -> Option<PageId> {
        self.resident.replace((page_id, page)).map(|(old, _)| old)
    }

    /// Empties the frame.
    pub fn reset(&mut self) -> Option<PageId> {
        self.resident.take().map(|(old, _)| old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::TableId;

    #[test]
    fn test_frame_new_is_empty() {
        let frame: BufferFrame<u32> = BufferFrame::new(FrameId(3));
        assert_eq!(frame.frame_id(), FrameId(3));
        assert!(frame.is_empty());
        assert!(frame.page_id().is_none());
        assert!(!frame.is_pinned());
    }

    #[test]
    fn test_frame_pin_follows_outstanding_handles() {
        let mut frame = BufferFrame::new(FrameId(0));
        let page_id = PageId::new(TableId(1), 0);
        frame.install(page_id, Arc::new(7u32));
        assert!(!frame.is_pinned());

        let handle = frame.page().unwrap();
        assert_eq!(*handle, 7);
        assert!(frame.is_pinned());

        drop(handle);
        assert!(!frame.is_pinned());
    }

    #[test]
    fn test_frame_install_and_reset() {
        let mut frame = BufferFrame::new(FrameId(0));
        let first = PageId::new(TableId(1), 0);
        let second = PageId::new(TableId(1), 1);

        assert_eq!(frame.install(first, Arc::new(1u32)), None);
        assert_eq!(frame.install(second, Arc::new(2u32)), Some(first));
        assert_eq!(frame.page_id(), Some(second));
        assert_eq!(frame.reset(), Some(second));
        assert!(frame.is_empty());
    }

    #[test]
    fn test_frame_id_display() {
        assert_eq!(FrameId(42).to_string(), "frame:42");
    }
}
