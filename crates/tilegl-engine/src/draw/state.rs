use bitflags::bitflags;

/// Pipeline configuration for subsequent draws.
///
/// Any state a draw path depends on belongs here, so that turning it on for one
/// caller cannot leak into callers that never thought about turning it off.
///
/// `Default` is the conservative baseline: every array and stage disabled,
/// `alpharef == 0`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct GlState {
    // vertex arrays
    pub array_vertex: bool,
    pub array_texcoord: bool,
    pub array_colour: bool,

    // render state
    pub blend: bool,
    pub texture: bool,
    pub depthtest: bool,
    pub alphatest: bool,
    /// Alpha-test threshold; only meaningful while `alphatest` is set.
    pub alpharef: u8,
}

bitflags! {
    /// Fields that differ between two applied states.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct StateChanges: u16 {
        const ARRAY_VERTEX   = 1 << 0;
        const ARRAY_TEXCOORD = 1 << 1;
        const ARRAY_COLOUR   = 1 << 2;
        const BLEND          = 1 << 3;
        const TEXTURE        = 1 << 4;
        const DEPTH_TEST     = 1 << 5;
        const ALPHA_TEST     = 1 << 6;
        const ALPHA_REF      = 1 << 7;
    }
}

impl GlState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields that must change to go from `previous` to `self`.
    ///
    /// A threshold change is only reported when alpha test is enabled in `self`.
    pub fn diff(&self, previous: &GlState) -> StateChanges {
        let mut changes = StateChanges::empty();
        changes.set(StateChanges::ARRAY_VERTEX, self.array_vertex != previous.array_vertex);
        changes.set(StateChanges::ARRAY_TEXCOORD, self.array_texcoord != previous.array_texcoord);
        changes.set(StateChanges::ARRAY_COLOUR, self.array_colour != previous.array_colour);
        changes.set(StateChanges::BLEND, self.blend != previous.blend);
        changes.set(StateChanges::TEXTURE, self.texture != previous.texture);
        changes.set(StateChanges::DEPTH_TEST, self.depthtest != previous.depthtest);
        changes.set(StateChanges::ALPHA_TEST, self.alphatest != previous.alphatest);
        changes.set(
            StateChanges::ALPHA_REF,
            self.alphatest && self.alpharef != previous.alpharef,
        );
        changes
    }

    /// Whether fragments are textured, given what a primitive supplies.
    #[inline]
    pub const fn samples_texture(&self, has_texcoords: bool) -> bool {
        self.texture && self.array_texcoord && has_texcoords
    }

    /// Whether per-vertex colours are read, given what a primitive supplies.
    #[inline]
    pub const fn reads_vertex_colour(&self, has_colours: bool) -> bool {
        self.array_colour && has_colours
    }

    /// Whether a fragment with alpha `alpha` (in `[0, 1]`) survives the alpha test.
    #[inline]
    pub fn passes_alpha_test(&self, alpha: f32) -> bool {
        !self.alphatest || alpha * 255.0 > f32::from(self.alpharef)
    }
}

/// Tracks the last configuration handed to a backend.
///
/// `apply` reports what actually changed so the backend can skip the rest.
#[derive(Debug, Default, Clone)]
pub(crate) struct AppliedState {
    current: Option<GlState>,
}

impl AppliedState {
    pub(crate) fn apply(&mut self, next: &GlState) -> StateChanges {
        let changes = match &self.current {
            Some(prev) => next.diff(prev),
            None => StateChanges::all(),
        };
        self.current = Some(*next);
        changes
    }

    #[inline]
    pub(crate) fn current(&self) -> GlState {
        self.current.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrays() -> GlState {
        GlState { array_vertex: true, array_colour: true, ..GlState::default() }
    }

    #[test]
    fn default_enables_nothing() {
        let s = GlState::new();
        assert!(!s.array_vertex && !s.array_texcoord && !s.array_colour);
        assert!(!s.blend && !s.texture && !s.depthtest && !s.alphatest);
        assert_eq!(s.alpharef, 0);
    }

    #[test]
    fn identical_states_have_empty_diff() {
        assert!(arrays().diff(&arrays()).is_empty());
    }

    #[test]
    fn diff_reports_each_changed_flag() {
        let next = GlState { blend: true, array_colour: false, ..arrays() };
        assert_eq!(next.diff(&arrays()), StateChanges::BLEND | StateChanges::ARRAY_COLOUR);
    }

    #[test]
    fn alpharef_ignored_while_alpha_test_disabled() {
        let next = GlState { alpharef: 10, ..arrays() };
        assert!(next.diff(&arrays()).is_empty());

        let tested = GlState { alphatest: true, alpharef: 10, ..arrays() };
        let retested = GlState { alpharef: 20, ..tested };
        assert_eq!(retested.diff(&tested), StateChanges::ALPHA_REF);
    }

    #[test]
    fn first_apply_touches_everything_then_only_changes() {
        let mut applied = AppliedState::default();
        assert_eq!(applied.apply(&arrays()), StateChanges::all());
        assert!(applied.apply(&arrays()).is_empty());
        assert_eq!(
            applied.apply(&GlState { depthtest: true, ..arrays() }),
            StateChanges::DEPTH_TEST
        );
    }

    #[test]
    fn alpha_test_is_strictly_greater() {
        let s = GlState { alphatest: true, alpharef: 128, ..GlState::default() };
        assert!(!s.passes_alpha_test(0.5));
        assert!(s.passes_alpha_test(0.51));
        assert!(GlState::default().passes_alpha_test(0.0));
    }
}
