/// World-space geometry: pixel rectangles and the four grid directions.
///
/// Rectangles follow the usual screen convention: `x` grows right, `y`
/// grows down, and `right()`/`bottom()` are exclusive.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Enumeration order used for direction options.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    /// Pixel delta (dx, dy) for one unit step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
            Direction::Right => (1, 0),
        }
    }

    /// Grid delta (d_row, d_col).
    pub fn tile_delta(self) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (dy, dx)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    /// A `w`×`h` box centred on (cx, cy).
    pub fn centered(cx: i32, cy: i32, w: i32, h: i32) -> Self {
        Rect { x: cx - w / 2, y: cy - h / 2, w, h }
    }

    pub fn right(&self) -> i32 { self.x + self.w }
    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    pub fn set_center(&mut self, cx: i32, cy: i32) {
        self.x = cx - self.w / 2;
        self.y = cy - self.h / 2;
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect { x: self.x + dx, y: self.y + dy, ..*self }
    }

    /// The box displaced `step` pixels toward `dir`.
    pub fn shifted(&self, dir: Direction, step: i32) -> Rect {
        let (dx, dy) = dir.delta();
        self.offset(dx * step, dy * step)
    }

    /// Strict overlap: boxes that only share an edge do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.overlaps(&Rect::new(10, 0, 10, 10)));
        assert!(!a.overlaps(&Rect::new(0, 10, 10, 10)));
        assert!(a.overlaps(&Rect::new(9, 9, 10, 10)));
        assert!(a.overlaps(&Rect::new(2, 2, 2, 2)));
    }

    #[test]
    fn shift_and_center() {
        let r = Rect::centered(50, 50, 24, 24);
        assert_eq!((r.x, r.y), (38, 38));
        assert_eq!(r.center(), (50, 50));
        assert_eq!(r.shifted(Direction::Left, 3), Rect::new(35, 38, 24, 24));
        assert_eq!(r.shifted(Direction::Down, 3), Rect::new(38, 41, 24, 24));
    }

    #[test]
    fn opposites_and_grid_deltas() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
        }
        assert_eq!(Direction::Up.tile_delta(), (-1, 0));
        assert_eq!(Direction::Right.tile_delta(), (0, 1));
    }
}
