use std::collections::BTreeSet;

use crate::manager::TextureId;

/// Texture name allocator.
///
/// Names start at 1. Deleted names are recycled lowest-first; the allocator
/// keeps no other bookkeeping, so liveness is the caller's business.
///
/// `u32::MAX` is never handed out. Once every name below it is live,
/// `generate` returns fewer names than asked for.
#[derive(Debug)]
pub(crate) struct TextureNames {
    next: u32,
    free: BTreeSet<u32>,
}

impl Default for TextureNames {
    fn default() -> Self {
        Self { next: 1, free: BTreeSet::new() }
    }
}

impl TextureNames {
    pub(crate) fn generate(&mut self, count: usize) -> Vec<TextureId> {
        let ids: Vec<_> = (0..count).map_while(|_| self.generate_one()).collect();
        if ids.len() < count {
            log::error!("texture names exhausted; generated {} of {count}", ids.len());
        }
        ids
    }

    fn generate_one(&mut self) -> Option<TextureId> {
        if let Some(id) = self.free.pop_first() {
            return Some(TextureId(id));
        }
        if self.next == u32::MAX {
            return None;
        }
        let id = self.next;
        self.next += 1;
        Some(TextureId(id))
    }

    /// Returns names to the pool. `TextureId::NONE` and names never handed
    /// out are ignored.
    pub(crate) fn delete(&mut self, ids: &[TextureId]) {
        for id in ids {
            if id.is_none() || id.0 >= self.next {
                debug_assert!(id.is_none(), "deleting texture {id:?} that was never generated");
                continue;
            }
            let fresh = self.free.insert(id.0);
            debug_assert!(fresh, "texture {id:?} deleted twice");
        }
    }

    #[inline]
    pub(crate) fn is_live(&self, id: TextureId) -> bool {
        !id.is_none() && id.0 < self.next && !self.free.contains(&id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_nonzero() {
        let mut names = TextureNames::default();
        let ids = names.generate(4);
        assert_eq!(ids, vec![TextureId(1), TextureId(2), TextureId(3), TextureId(4)]);
        assert!(ids.iter().all(|id| names.is_live(*id)));
    }

    #[test]
    fn delete_then_generate_leaves_other_names_alone() {
        let mut names = TextureNames::default();
        let keep = names.generate(2);
        let temp = names.generate(3);
        names.delete(&temp);

        assert!(keep.iter().all(|id| names.is_live(*id)));
        assert!(temp.iter().all(|id| !names.is_live(*id)));

        let again = names.generate(3);
        assert!(again.iter().all(|id| !keep.contains(id)));
        assert_eq!(again, temp);
    }

    #[test]
    fn exhausted_pool_never_reissues_a_live_name() {
        let mut names = TextureNames { next: u32::MAX - 1, free: BTreeSet::new() };
        let last = names.generate(3);
        assert_eq!(last, vec![TextureId(u32::MAX - 1)]);
        assert!(names.generate(1).is_empty());

        names.delete(&last);
        assert_eq!(names.generate(2), last);
    }
}
