//! Buffer pool manager.

use crate::frame::{BufferFrame, FrameId};
use crate::replacer::{ClockReplacer, Replacer};
use parking_lot::Mutex;
use quarry_common::{DEFAULT_POOL_PAGES, PageId, QuarryError, Result, StorageConfig, TableId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub num_frames: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            num_frames: DEFAULT_POOL_PAGES,
        }
    }
}

impl From<&StorageConfig> for BufferPoolConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            num_frames: config.buffer_pool_pages,
        }
    }
}

/// Snapshot of buffer pool occupancy and effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolStats {
    pub total_frames: usize,
    pub free_frames: usize,
    pub used_frames: usize,
    pub pinned_frames: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Fixed-capacity cache of decoded pages.
///
/// Maps page ids to frames, fills free frames first and falls back to
/// clock replacement once the pool is full. A frame whose page is still
/// referenced by a caller is never chosen as a victim.
pub struct BufferPool<P> {
    config: BufferPoolConfig,
    state: Mutex<PoolState<P>>,
    replacer: ClockReplacer,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct PoolState<P> {
    frames: Vec<BufferFrame<P>>,
    page_table: HashMap<PageId, FrameId>,
    free_list: Vec<FrameId>,
}

impl<P> BufferPool<P> {
    /// Creates a new buffer pool.
    pub fn new(config: BufferPoolConfig) -> Self {
        let num_frames = config.num_frames;
        let frames = (0..num_frames)
            .map(|i| BufferFrame::new(FrameId(i as u32)))
            .collect();
        // Reversed so that frame 0 is handed out first.
        let free_list = (0..num_frames).rev().map(|i| FrameId(i as u32)).collect();

        Self {
            config,
            state: Mutex::new(PoolState {
                frames,
                page_table: HashMap::with_capacity(num_frames),
                free_list,
            }),
            replacer: ClockReplacer::new(num_frames),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the number of frames in the pool.
    pub fn num_frames(&self) -> usize {
        self.config.num_frames
    }

    /// Returns the number of free frames.
    pub fn free_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Returns the number of pages currently in the pool.
    pub fn page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    /// Checks if a page is in the buffer pool.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// Returns the cached page, or None if it is not resident.
    pub fn fetch_page(&self, page_id: PageId) -> Option<Arc<P>> {
        let state = self.state.lock();
        let frame_id = *state.page_table.get(&page_id)?;
        let page = state.frames[frame_id.0 as usize].page()?;
        self.replacer.record_access(frame_id);
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(page)
    }

    /// Returns the cached page, loading it with `load` on a miss.
    ///
    /// The loader runs without the pool lock held. If another caller
    /// installed the same page in the meantime, their copy wins and the
    /// freshly loaded one is dropped. A failing loader leaves the pool
    /// untouched.
    pub fn get_or_load<F>(&self, page_id: PageId, load: F) -> Result<Arc<P>>
    where
        F: FnOnce() -> Result<P>,
    {
        if let Some(page) = self.fetch_page(page_id) {
            return Ok(page);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let page = Arc::new(load()?);

        let mut state = self.state.lock();
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            if let Some(existing) = state.frames[frame_id.0 as usize].page() {
                self.replacer.record_access(frame_id);
                return Ok(existing);
            }
        }

        let frame_id = self.allocate_frame(&mut state)?;
        state.frames[frame_id.0 as usize].install(page_id, Arc::clone(&page));
        state.page_table.insert(page_id, frame_id);
        self.replacer.insert(frame_id);
        trace!(%page_id, %frame_id, "page installed");

        Ok(page)
    }

    /// Picks a free frame, evicting an unpinned page if none is free.
    fn allocate_frame(&self, state: &mut PoolState<P>) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop() {
            return Ok(frame_id);
        }

        let frames = &state.frames;
        let victim = self
            .replacer
            .evict(&|fid: FrameId| !frames[fid.0 as usize].is_pinned())
            .ok_or(QuarryError::BufferPoolFull)?;

        if let Some(old_page_id) = state.frames[victim.0 as usize].reset() {
            state.page_table.remove(&old_page_id);
            trace!(page_id = %old_page_id, frame_id = %victim, "page evicted");
        }
        Ok(victim)
    }

    /// Drops a page from the pool without consulting the replacer.
    ///
    /// Callers that still hold the page keep a valid handle. Returns false if
    /// the page was not resident.
    pub fn discard_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        let Some(frame_id) = state.page_table.remove(&page_id) else {
            return false;
        };
        state.frames[frame_id.0 as usize].reset();
        state.free_list.push(frame_id);
        self.replacer.remove(frame_id);
        true
    }

    /// Drops every resident page of `table_id` and returns how many there were.
    pub fn discard_table(&self, table_id: TableId) -> usize {
        let mut state = self.state.lock();
        let doomed: Vec<(PageId, FrameId)> = state
            .page_table
            .iter()
            .filter(|(page_id, _)| page_id.table_id == table_id)
            .map(|(&page_id, &frame_id)| (page_id, frame_id))
            .collect();
        for &(page_id, frame_id) in &doomed {
            state.page_table.remove(&page_id);
            state.frames[frame_id.0 as usize].reset();
            state.free_list.push(frame_id);
            self.replacer.remove(frame_id);
        }
        if !doomed.is_empty() {
            trace!(%table_id, pages = doomed.len(), "table pages discarded");
        }
        doomed.len()
    }

    /// Drops every resident page.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let resident: Vec<FrameId> = state.page_table.drain().map(|(_, fid)| fid).collect();
        for frame_id in resident {
            state.frames[frame_id.0 as usize].reset();
            state.free_list.push(frame_id);
            self.replacer.remove(frame_id);
        }
    }

    /// Returns buffer pool statistics.
    pub fn stats(&self) -> BufferPoolStats {
        let state = self.state.lock();
        let pinned_frames = state.frames.iter().filter(|f| f.is_pinned()).count();
        BufferPoolStats {
            total_frames: self.config.num_frames,
            free_frames: state.free_list.len(),
            used_frames: state.page_table.len(),
            pinned_frames,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
