//! The 3x3 gesture grid and its move rule.
//!
//! Points are numbered row by row:
//!
//! ```text
//! 1 2 3
//! 4 5 6
//! 7 8 9
//! ```

/// A grid position in `1..=9`.
pub type Point = u8;

pub const MIN_POINT: Point = 1;
pub const MAX_POINT: Point = 9;

/// Ordered pairs whose straight connection crosses a third point, with that
/// middle point. Each of the eight lines appears in both directions.
pub const JUMP_PAIRS: [(Point, Point, Point); 16] = [
    // corner through edge midpoint
    (1, 3, 2),
    (3, 1, 2),
    (1, 7, 4),
    (7, 1, 4),
    (3, 9, 6),
    (9, 3, 6),
    (7, 9, 8),
    (9, 7, 8),
    // corner through center
    (1, 9, 5),
    (9, 1, 5),
    (3, 7, 5),
    (7, 3, 5),
    // edge midpoint through center
    (2, 8, 5),
    (8, 2, 5),
    (4, 6, 5),
    (6, 4, 5),
];

pub fn is_point(p: Point) -> bool {
    (MIN_POINT..=MAX_POINT).contains(&p)
}

/// Middle point crossed when moving from `from` to `to`, if any.
pub fn middle_of(from: Point, to: Point) -> Option<Point> {
    JUMP_PAIRS
        .iter()
        .find(|&&(a, b, _)| a == from && b == to)
        .map(|&(_, _, mid)| mid)
}

/// Whether `path` may be extended with `next`.
///
/// `next` must be unvisited, and a jump over a middle point is only legal
/// once that middle point is already part of the path.
pub fn is_valid_move(path: &[Point], next: Point) -> bool {
    if !is_point(next) || path.contains(&next) {
        return false;
    }

    let Some(&last) = path.last() else {
        return true;
    };

    match middle_of(last, next) {
        Some(mid) => path.contains(&mid),
        None => true,
    }
}
