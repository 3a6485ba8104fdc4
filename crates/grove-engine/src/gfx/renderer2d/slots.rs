use crate::gfx::backend::{TextureHandle, MAX_TEXTURE_SLOTS};

/// Fixed-capacity texture table for the batch being recorded.
///
/// Slot 0 always holds the white texture. Lookups are a linear scan: the table
/// never exceeds [`MAX_TEXTURE_SLOTS`] entries.
#[derive(Debug, Clone)]
pub(super) struct TextureSlots {
    slots: [TextureHandle; MAX_TEXTURE_SLOTS],
    len: usize,
}

impl TextureSlots {
    pub(super) fn new(white: TextureHandle) -> Self {
        Self {
            slots: [white; MAX_TEXTURE_SLOTS],
            len: 1,
        }
    }

    /// Drops every slot except the white texture.
    #[inline]
    pub(super) fn reset(&mut self) {
        let white = self.slots[0];
        self.slots = [white; MAX_TEXTURE_SLOTS];
        self.len = 1;
    }

    #[inline]
    pub(super) fn find(&self, texture: TextureHandle) -> Option<usize> {
        self.as_slice().iter().position(|&t| t == texture)
    }

    /// Returns the slot of `texture`, appending it when absent.
    ///
    /// `None` means the table is full and `texture` is not in it.
    pub(super) fn find_or_insert(&mut self, texture: TextureHandle) -> Option<usize> {
        if let Some(slot) = self.find(texture) {
            return Some(slot);
        }
        if self.is_full() {
            return None;
        }
        let slot = self.len;
        self.slots[slot] = texture;
        self.len += 1;
        Some(slot)
    }

    #[inline]
    pub(super) fn is_full(&self) -> bool {
        self.len == MAX_TEXTURE_SLOTS
    }

    #[inline]
    pub(super) fn len(&self) -> usize {
        self.len
    }

    /// Occupied slots in index order.
    #[inline]
    pub(super) fn as_slice(&self) -> &[TextureHandle] {
        &self.slots[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: TextureHandle = TextureHandle(100);

    #[test]
    fn starts_with_white_in_slot_zero() {
        let s = TextureSlots::new(WHITE);
        assert_eq!(s.as_slice(), &[WHITE]);
        assert_eq!(s.find(WHITE), Some(0));
    }

    #[test]
    fn repeated_texture_reuses_its_slot() {
        let mut s = TextureSlots::new(WHITE);
        assert_eq!(s.find_or_insert(TextureHandle(1)), Some(1));
        assert_eq!(s.find_or_insert(TextureHandle(2)), Some(2));
        assert_eq!(s.find_or_insert(TextureHandle(1)), Some(1));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn full_table_rejects_new_textures_but_finds_old_ones() {
        let mut s = TextureSlots::new(WHITE);
        for i in 1..MAX_TEXTURE_SLOTS as u32 {
            assert_eq!(s.find_or_insert(TextureHandle(i)), Some(i as usize));
        }
        assert!(s.is_full());
        assert_eq!(s.find_or_insert(TextureHandle(999)), None);
        assert_eq!(s.find_or_insert(TextureHandle(7)), Some(7));
        assert_eq!(s.find_or_insert(WHITE), Some(0));
    }

    #[test]
    fn reset_keeps_only_white() {
        let mut s = TextureSlots::new(WHITE);
        s.find_or_insert(TextureHandle(1));
        s.find_or_insert(TextureHandle(2));
        s.reset();
        assert_eq!(s.as_slice(), &[WHITE]);
        assert_eq!(s.find(TextureHandle(1)), None);
    }
}
