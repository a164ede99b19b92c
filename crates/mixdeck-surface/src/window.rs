//! Strip window - maps the ordered chain list onto fixed strip slots
//!
//! ```text
//! chains:  [c1 c2 c3 c4 c5 c6 c7 c8 c9 c10]      master
//!                   └─ offset = 2 ──────┐           │
//! strips:        [s0 s1 s2 s3 s4 s5]   (6 visible)  [M]
//! ```
//!
//! The master bus is never part of the scrolling order; it always sits on
//! the pinned master strip. Every window mutation finishes before it
//! returns, so the next tick always renders a consistent window.

use crate::refresh::{RefreshQueue, StripField};
use crate::strip::{Strip, StripSlot};
use mixdeck_core::{ChainDirectory, ChainId, EngineParams, MixerChannel};

pub struct StripWindow {
    strips: Vec<Strip>,
    master: Strip,
    /// Chain order without the master
    order: Vec<ChainId>,
    offset: usize,
    active: ChainId,
    highlighted: Option<StripSlot>,
    /// Strip hidden while its geometry changes
    resizing: Option<StripSlot>,
    queue: RefreshQueue,
}

impl StripWindow {
    pub fn new(visible_count: usize, queue: RefreshQueue) -> Self {
        let visible_count = visible_count.max(1);
        Self {
            strips: (0..visible_count).map(|i| Strip::new(StripSlot::Visible(i))).collect(),
            master: Strip::new(StripSlot::Master),
            order: Vec::new(),
            offset: 0,
            active: ChainId::MASTER,
            highlighted: None,
            resizing: None,
            queue,
        }
    }

    pub fn visible_count(&self) -> usize {
        self.strips.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Largest valid offset for the current chain list
    pub fn max_offset(&self) -> usize {
        self.order.len().saturating_sub(self.visible_count())
    }

    pub fn order(&self) -> &[ChainId] {
        &self.order
    }

    pub fn active(&self) -> ChainId {
        self.active
    }

    pub fn highlighted(&self) -> Option<StripSlot> {
        self.highlighted
    }

    pub fn strip(&self, slot: StripSlot) -> Option<&Strip> {
        match slot {
            StripSlot::Visible(i) => self.strips.get(i),
            StripSlot::Master => Some(&self.master),
        }
    }

    pub fn strip_mut(&mut self, slot: StripSlot) -> Option<&mut Strip> {
        match slot {
            StripSlot::Visible(i) => self.strips.get_mut(i),
            StripSlot::Master => Some(&mut self.master),
        }
    }

    /// Every strip, master last
    pub fn strips(&self) -> impl Iterator<Item = &Strip> {
        self.strips.iter().chain(std::iter::once(&self.master))
    }

    pub fn strips_mut(&mut self) -> impl Iterator<Item = &mut Strip> {
        self.strips.iter_mut().chain(std::iter::once(&mut self.master))
    }

    /// Position of `id` in the scrolling order
    pub fn position(&self, id: ChainId) -> Option<usize> {
        self.order.iter().position(|c| *c == id)
    }

    /// Slot currently showing `id`
    pub fn slot_for_chain(&self, id: ChainId) -> Option<StripSlot> {
        if id.is_master() {
            return Some(StripSlot::Master);
        }
        let pos = self.position(id)?;
        if pos >= self.offset && pos < self.offset + self.visible_count() {
            Some(StripSlot::Visible(pos - self.offset))
        } else {
            None
        }
    }

    /// Slot whose bindings belong to `channel`
    pub fn slot_for_channel(&self, channel: MixerChannel) -> Option<StripSlot> {
        self.strips()
            .find(|s| s.channel() == Some(channel))
            .map(|s| s.slot())
    }

    /// Chain under a visible slot
    pub fn chain_at(&self, slot: StripSlot) -> Option<ChainId> {
        match slot {
            StripSlot::Visible(i) => self.order.get(self.offset + i).copied(),
            StripSlot::Master => Some(ChainId::MASTER),
        }
    }

    /// Replace the chain order and rebind every strip
    ///
    /// The offset only moves if it is now past the end.
    pub fn set_chain_list(
        &mut self,
        ordered: &[ChainId],
        directory: &dyn ChainDirectory,
        engine: &dyn EngineParams,
    ) {
        self.order = ordered.iter().copied().filter(|id| !id.is_master()).collect();
        let max = self.max_offset();
        if self.offset > max {
            log::debug!("Mixer: offset {} clamped to {}", self.offset, max);
            self.offset = max;
        }
        self.rebind(directory, engine);
    }

    /// Rebind every strip to the chain now under it
    pub fn rebind(&mut self, directory: &dyn ChainDirectory, engine: &dyn EngineParams) {
        for i in 0..self.strips.len() {
            let chain = self
                .order
                .get(self.offset + i)
                .and_then(|id| directory.get_chain(*id));
            self.strips[i].bind(chain, engine);
            self.queue.invalidate(StripSlot::Visible(i));
        }
        self.master.bind(directory.get_chain(ChainId::MASTER), engine);
        self.queue.invalidate(StripSlot::Master);
        self.apply_highlight();
    }

    /// Make `id` the active chain, paging the minimum needed to show it
    ///
    /// Returns false if `id` is not in the chain list.
    pub fn set_active(
        &mut self,
        id: ChainId,
        directory: &dyn ChainDirectory,
        engine: &dyn EngineParams,
    ) -> bool {
        if !id.is_master() {
            let Some(pos) = self.position(id) else {
                log::debug!("Mixer: {} not in chain list", id);
                return false;
            };
            let visible = self.visible_count();
            let offset = if pos < self.offset {
                pos
            } else if pos >= self.offset + visible {
                pos + 1 - visible
            } else {
                self.offset
            };
            if offset != self.offset {
                log::debug!("Mixer: paging offset {} -> {} for {}", self.offset, offset, id);
                self.offset = offset;
                self.active = id;
                self.rebind(directory, engine);
                return true;
            }
        }
        self.active = id;
        self.apply_highlight();
        true
    }

    /// Scroll by `delta` strips, stopping at either end of the list
    ///
    /// If the active chain scrolls out of view, the chain at the nearest
    /// edge becomes active. Returns true if the window moved.
    pub fn scroll(
        &mut self,
        delta: i32,
        directory: &dyn ChainDirectory,
        engine: &dyn EngineParams,
    ) -> bool {
        let max = self.max_offset() as i64;
        let target = (self.offset as i64 + delta as i64).clamp(0, max) as usize;
        if target == self.offset {
            return false;
        }
        self.offset = target;

        if let Some(pos) = self.position(self.active) {
            let visible = self.visible_count();
            let edge = if pos < self.offset {
                Some(self.offset)
            } else if pos >= self.offset + visible {
                Some(self.offset + visible - 1)
            } else {
                None
            };
            if let Some(edge) = edge.and_then(|p| self.order.get(p).copied()) {
                log::debug!("Mixer: {} scrolled out, {} now active", self.active, edge);
                if directory.set_active(edge) {
                    self.active = edge;
                }
            }
        }
        self.rebind(directory, engine);
        true
    }

    /// Swap the active chain with its neighbour in `direction`
    pub fn move_active(
        &mut self,
        direction: i32,
        directory: &dyn ChainDirectory,
        engine: &dyn EngineParams,
    ) -> bool {
        if self.active.is_master() || !directory.move_active(direction.signum()) {
            return false;
        }
        self.set_chain_list(&directory.ordered_chain_ids(), directory, engine);
        self.set_active(directory.active_chain_id(), directory, engine)
    }

    /// Hide one strip while its geometry changes; unhides any previous one
    pub fn begin_resize(&mut self, slot: StripSlot) {
        self.end_resize();
        if let Some(strip) = self.strip_mut(slot) {
            strip.set_hidden(true);
            self.resizing = Some(slot);
        }
    }

    pub fn end_resize(&mut self) {
        if let Some(slot) = self.resizing.take() {
            if let Some(strip) = self.strip_mut(slot) {
                strip.set_hidden(false);
            }
            self.queue.invalidate(slot);
        }
    }

    /// Queue a full redraw of every strip
    pub fn invalidate_all(&self) {
        for i in 0..self.strips.len() {
            self.queue.invalidate(StripSlot::Visible(i));
        }
        self.queue.invalidate(StripSlot::Master);
    }

    /// Downlight the old strip, then light the one showing the active chain
    fn apply_highlight(&mut self) {
        let target = self.slot_for_chain(self.active);
        if let Some(old) = self.highlighted.filter(|old| Some(*old) != target) {
            if let Some(strip) = self.strip_mut(old) {
                strip.set_highlight(false);
            }
            self.queue.enqueue(old, StripField::Highlight);
        }
        self.highlighted = target;
        if let Some(slot) = target {
            if let Some(strip) = self.strip_mut(slot) {
                if strip.set_highlight(true) {
                    self.queue.enqueue(slot, StripField::Highlight);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixdeck_core::InMemoryConsole;

    fn window(chains: usize, visible: usize) -> (InMemoryConsole, StripWindow, RefreshQueue) {
        let console = InMemoryConsole::with_audio_chains(chains);
        let queue = RefreshQueue::new();
        let mut window = StripWindow::new(visible, queue.clone());
        window.set_chain_list(&console.ordered_chain_ids(), &console, &console);
        (console, window, queue)
    }

    fn assert_offset_in_bounds(window: &StripWindow) {
        assert!(window.offset() <= window.max_offset());
    }

    fn highlighted_count(window: &StripWindow) -> usize {
        window.strips().filter(|s| s.is_highlighted()).count()
    }

    #[test]
    fn test_master_excluded_from_order() {
        let (_, window, _) = window(3, 6);
        assert_eq!(window.order(), &[ChainId(1), ChainId(2), ChainId(3)]);
        assert_eq!(window.strip(StripSlot::Master).unwrap().chain_id(), Some(ChainId::MASTER));
        assert_eq!(window.strip(StripSlot::Visible(3)).unwrap().chain_id(), None);
    }

    #[test]
    fn test_set_active_pages_to_near_edge() {
        let (console, mut window, _) = window(10, 6);
        // chain at position 8 has id 9
        assert!(window.set_active(ChainId(9), &console, &console));
        assert_eq!(window.offset(), 3);
        assert_eq!(window.slot_for_chain(ChainId(9)), Some(StripSlot::Visible(5)));
        assert_eq!(window.highlighted(), Some(StripSlot::Visible(5)));

        // paging back aligns the chain at the left edge
        assert!(window.set_active(ChainId(2), &console, &console));
        assert_eq!(window.offset(), 1);
        assert_eq!(window.slot_for_chain(ChainId(2)), Some(StripSlot::Visible(0)));
    }

    #[test]
    fn test_set_active_inside_window_keeps_offset() {
        let (console, mut window, _) = window(10, 6);
        window.set_active(ChainId(9), &console, &console);
        window.set_active(ChainId(6), &console, &console);
        assert_eq!(window.offset(), 3);
        assert_eq!(highlighted_count(&window), 1);
    }

    #[test]
    fn test_master_never_pages() {
        let (console, mut window, _) = window(10, 6);
        window.set_active(ChainId(9), &console, &console);
        window.set_active(ChainId::MASTER, &console, &console);
        assert_eq!(window.offset(), 3);
        assert_eq!(window.highlighted(), Some(StripSlot::Master));
        assert_eq!(highlighted_count(&window), 1);
    }

    #[test]
    fn test_unknown_chain_is_skipped() {
        let (console, mut window, _) = window(4, 6);
        assert!(!window.set_active(ChainId(42), &console, &console));
        assert_eq!(window.active(), ChainId::MASTER);
    }

    #[test]
    fn test_highlight_moves_with_one_pair_of_updates() {
        let (console, mut window, queue) = window(4, 6);
        window.set_active(ChainId(1), &console, &console);
        queue.drain();

        window.set_active(ChainId(3), &console, &console);
        let batch = queue.drain();
        assert!(batch.contains(StripSlot::Visible(0), StripField::Highlight));
        assert!(batch.contains(StripSlot::Visible(2), StripField::Highlight));
        assert_eq!(batch.len(), 2);
        assert!(!window.strip(StripSlot::Visible(0)).unwrap().is_highlighted());
        assert!(window.strip(StripSlot::Visible(2)).unwrap().is_highlighted());
    }

    #[test]
    fn test_scroll_bounds_are_noops() {
        let (console, mut window, _) = window(10, 6);
        assert!(!window.scroll(-1, &console, &console));
        assert!(window.scroll(4, &console, &console));
        assert_eq!(window.offset(), 4);
        assert!(!window.scroll(1, &console, &console));
        assert_eq!(window.offset(), 4);
        assert_offset_in_bounds(&window);
    }

    #[test]
    fn test_scroll_past_end_stops_at_edge() {
        let (console, mut window, _) = window(10, 6);
        assert!(window.scroll(3, &console, &console));
        assert!(window.scroll(3, &console, &console));
        assert_eq!(window.offset(), 4);
        assert!(window.scroll(-9, &console, &console));
        assert_eq!(window.offset(), 0);
        assert_offset_in_bounds(&window);
    }

    #[test]
    fn test_scroll_drags_active_to_nearest_edge() {
        let (console, mut window, _) = window(10, 6);
        console.set_active(ChainId(1));
        window.set_active(ChainId(1), &console, &console);

        assert!(window.scroll(2, &console, &console));
        assert_eq!(window.active(), ChainId(3));
        assert_eq!(console.active_chain_id(), ChainId(3));
        assert_eq!(window.highlighted(), Some(StripSlot::Visible(0)));
        assert_eq!(highlighted_count(&window), 1);
    }

    #[test]
    fn test_shrinking_list_clamps_offset() {
        let (console, mut window, _) = window(10, 6);
        window.scroll(4, &console, &console);
        for id in 5..=10 {
            console.remove_chain(ChainId(id));
        }
        window.set_chain_list(&console.ordered_chain_ids(), &console, &console);
        assert_eq!(window.offset(), 0);
        assert_offset_in_bounds(&window);
    }

    #[test]
    fn test_set_chain_list_keeps_valid_offset() {
        let (console, mut window, _) = window(10, 6);
        window.scroll(2, &console, &console);
        console.remove_chain(ChainId(10));
        window.set_chain_list(&console.ordered_chain_ids(), &console, &console);
        assert_eq!(window.offset(), 2);
    }

    #[test]
    fn test_move_active_swaps_and_follows() {
        let (console, mut window, _) = window(10, 6);
        console.set_active(ChainId(6));
        window.set_active(ChainId(6), &console, &console);

        assert!(window.move_active(1, &console, &console));
        assert_eq!(window.position(ChainId(6)), Some(6));
        assert_eq!(window.offset(), 1);
        assert_eq!(window.slot_for_chain(ChainId(6)), Some(StripSlot::Visible(5)));
    }

    #[test]
    fn test_move_active_at_boundary_is_noop() {
        let (console, mut window, _) = window(3, 6);
        console.set_active(ChainId(3));
        window.set_active(ChainId(3), &console, &console);
        assert!(!window.move_active(1, &console, &console));
        assert_eq!(window.order(), &[ChainId(1), ChainId(2), ChainId(3)]);
    }

    #[test]
    fn test_offset_invariant_under_mixed_operations() {
        let (console, mut window, _) = window(12, 6);
        let steps: [i32; 8] = [3, -1, 5, 2, -6, 4, -2, 1];
        for (i, step) in steps.iter().enumerate() {
            window.scroll(*step, &console, &console);
            assert_offset_in_bounds(&window);
            let id = ChainId((i as u32 * 5) % 12 + 1);
            window.set_active(id, &console, &console);
            assert_offset_in_bounds(&window);
            let pos = window.position(id).unwrap();
            assert!(pos >= window.offset() && pos < window.offset() + window.visible_count());
            assert_eq!(highlighted_count(&window), 1);
        }
    }

    #[test]
    fn test_resize_hides_one_strip_at_a_time() {
        let (_, mut window, _) = window(4, 6);
        window.begin_resize(StripSlot::Visible(1));
        window.begin_resize(StripSlot::Visible(2));
        let hidden: Vec<_> = window.strips().filter(|s| s.is_hidden()).map(|s| s.slot()).collect();
        assert_eq!(hidden, vec![StripSlot::Visible(2)]);
        window.end_resize();
        assert!(window.strips().all(|s| !s.is_hidden()));
    }

    #[test]
    fn test_slot_for_channel() {
        let (console, window, _) = window(4, 6);
        assert_eq!(window.slot_for_channel(MixerChannel(2)), Some(StripSlot::Visible(2)));
        assert_eq!(window.slot_for_channel(console.master_channel()), Some(StripSlot::Master));
        assert_eq!(window.slot_for_channel(MixerChannel(9)), None);
    }
}
