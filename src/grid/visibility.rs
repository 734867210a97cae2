//! Line-of-sight visibility over a [`Grid`](super::Grid): a slope-intercept
//! sight-line algorithm over the tile grid.

use super::Grid;

/// Is (r, c) visible from the viewpoint (pr, pc) on `base`?
///
/// Blank cells are never visible. Same-row and same-column sight lines walk
/// the intermediate cells directly. A sloping sight line walks both the
/// integer rows and integer columns strictly between the two points,
/// computing the exact fractional intercept at each and blocking only when
/// *both* flanking cells (floor and ceil of the intercept) are non-room-spots.
/// A sight line that grazes a corner exactly (an integral intercept) is
/// therefore never blocked by that corner alone.
pub fn is_visible(base: &Grid, r: i64, c: i64, pr: i64, pc: i64) -> bool {
    if Grid::is_blank(base.get(r, c)) {
        return false;
    }

    let rdelta = r - pr;
    let cdelta = c - pc;

    if rdelta == 0 && cdelta == 0 {
        return true;
    }

    if cdelta == 0 {
        let rsign = if rdelta < 0 { -1 } else { 1 };
        let mut row = pr + rsign;
        while row != r {
            if !Grid::is_room_spot(base.get(row, c)) {
                return false;
            }
            row += rsign;
        }
        return true;
    }

    if rdelta == 0 {
        let csign = if cdelta < 0 { -1 } else { 1 };
        let mut col = pc + csign;
        while col != c {
            if !Grid::is_room_spot(base.get(r, col)) {
                return false;
            }
            col += csign;
        }
        return true;
    }

    let rsign = if rdelta < 0 { -1 } else { 1 };
    let csign = if cdelta < 0 { -1 } else { 1 };
    let slope = rdelta as f64 / cdelta as f64;

    let mut row = pr + rsign;
    while row != r {
        let colcept = pc as f64 + (row - pr) as f64 / slope;
        let lo = colcept.floor() as i64;
        let hi = colcept.ceil() as i64;
        if !Grid::is_room_spot(base.get(row, lo)) && !Grid::is_room_spot(base.get(row, hi)) {
            return false;
        }
        row += rsign;
    }

    let mut col = pc + csign;
    while col != c {
        let rowcept = pr as f64 + slope * (col - pc) as f64;
        let lo = rowcept.floor() as i64;
        let hi = rowcept.ceil() as i64;
        if !Grid::is_room_spot(base.get(lo, col)) && !Grid::is_room_spot(base.get(hi, col)) {
            return false;
        }
        col += csign;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(rows: usize, cols: usize) -> Grid {
        // An all-floor room with a wall border, large enough for diagonal sight tests.
        let mut lines = Vec::with_capacity(rows);
        for r in 0..rows {
            let mut line = String::with_capacity(cols);
            for c in 0..cols {
                if r == 0 || r == rows - 1 {
                    line.push('-');
                } else if c == 0 || c == cols - 1 {
                    line.push('|');
                } else {
                    line.push('.');
                }
            }
            lines.push(line);
        }
        Grid::from_str(&(lines.join("\n") + "\n")).unwrap()
    }

    #[test]
    fn same_point_is_visible() {
        let g = room(5, 5);
        assert!(is_visible(&g, 2, 2, 2, 2));
    }

    #[test]
    fn blank_is_never_visible() {
        let g = Grid::new(5, 5).unwrap();
        assert!(!is_visible(&g, 2, 2, 0, 0));
    }

    #[test]
    fn straight_line_blocked_by_wall() {
        let mut g = room(7, 7);
        g.set(3, 3, b'|'); // place a wall directly between viewer and target
        assert!(!is_visible(&g, 5, 1, 1, 1));
    }

    #[test]
    fn visibility_is_symmetric_for_room_spots() {
        let g = room(9, 9);
        for &(ar, ac, br, bc) in &[(1, 1, 7, 7), (1, 7, 7, 1), (4, 1, 1, 6), (2, 2, 6, 5)] {
            assert_eq!(
                is_visible(&g, br, bc, ar, ac),
                is_visible(&g, ar, ac, br, bc),
                "asymmetry at ({ar},{ac}) <-> ({br},{bc})"
            );
        }
    }

    #[test]
    fn integral_corner_intercept_does_not_block() {
        // A grazing diagonal whose intercept lands exactly on a room cell should see through.
        let g = room(5, 5);
        assert!(is_visible(&g, 3, 3, 1, 1));
    }
}
