/// Fixed teleport pair (the wrap-around tunnel).
///
/// Two endpoint boxes from the map. A body overlapping one endpoint is placed
/// one endpoint-extent beside the other, on the side facing back toward the
/// first, so it lands inside the maze and clear of the exit endpoint.

use super::geom::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleportPair {
    pub a: Rect,
    pub b: Rect,
}

impl TeleportPair {
    pub fn from_endpoints(a: Rect, b: Rect) -> Self {
        TeleportPair { a, b }
    }

    /// Relocate `body` if it overlaps an endpoint. Returns true when moved.
    pub fn check_teleport(&self, body: &mut Rect) -> bool {
        if body.overlaps(&self.a) {
            let (x, y) = exit_beside(&self.b, &self.a);
            body.x = x;
            body.y = y;
            true
        } else if body.overlaps(&self.b) {
            let (x, y) = exit_beside(&self.a, &self.b);
            body.x = x;
            body.y = y;
            true
        } else {
            false
        }
    }
}

/// Landing spot next to `dest`, shifted one extent toward `from`.
fn exit_beside(dest: &Rect, from: &Rect) -> (i32, i32) {
    if dest.x > from.x {
        (dest.x - dest.w, dest.y)
    } else if dest.x < from.x {
        (dest.x + dest.w, dest.y)
    } else if dest.y > from.y {
        (dest.x, dest.y - dest.h)
    } else {
        (dest.x, dest.y + dest.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunnel() -> TeleportPair {
        TeleportPair::from_endpoints(Rect::new(0, 96, 24, 24), Rect::new(216, 96, 24, 24))
    }

    #[test]
    fn left_mouth_exits_inside_right_mouth() {
        let tp = tunnel();
        let mut body = Rect::new(10, 96, 24, 24);
        assert!(tp.check_teleport(&mut body));
        assert_eq!((body.x, body.y), (192, 96));
        assert!(!body.overlaps(&tp.b));
    }

    #[test]
    fn right_mouth_exits_inside_left_mouth() {
        let tp = tunnel();
        let mut body = Rect::new(200, 96, 24, 24);
        assert!(tp.check_teleport(&mut body));
        assert_eq!((body.x, body.y), (24, 96));
        assert!(!body.overlaps(&tp.a));
    }

    #[test]
    fn vertical_pair() {
        let tp = TeleportPair::from_endpoints(Rect::new(48, 0, 24, 24), Rect::new(48, 240, 24, 24));
        let mut body = Rect::new(48, 5, 24, 24);
        assert!(tp.check_teleport(&mut body));
        assert_eq!((body.x, body.y), (48, 216));
    }

    #[test]
    fn no_overlap_no_move() {
        let tp = tunnel();
        let mut body = Rect::new(24, 96, 24, 24);
        assert!(!tp.check_teleport(&mut body));
        assert_eq!((body.x, body.y), (24, 96));
    }
}
