/// Window or drawable extent in whole pixels.
///
/// Passed to `reset_view_for_resize`; backends size their colour and depth
/// storage from it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct WindowSize {
    pub x: u32,
    pub y: u32,
}

impl WindowSize {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.x == 0 || self.y == 0
    }

    #[inline]
    pub const fn area(self) -> usize {
        self.x as usize * self.y as usize
    }
}
