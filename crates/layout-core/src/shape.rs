//! Grid shape inference when rows or columns are left unspecified.

/// Fill in missing `rows`/`cols` so the grid holds `count` items.
///
/// With both missing the grid is as square as possible, wider than tall.
/// Explicit values are returned untouched, even if invalid, so validation
/// can report them.
pub fn auto_shape(rows: Option<u32>, cols: Option<u32>, count: usize) -> (u32, u32) {
    let count = count.max(1) as u64;
    let fill = |fixed: u32| count.div_ceil(u64::from(fixed.max(1))).min(u64::from(u32::MAX)) as u32;

    match (rows, cols) {
        (Some(r), Some(c)) => (r, c),
        (Some(r), None) => (r, fill(r)),
        (None, Some(c)) => (fill(c), c),
        (None, None) => {
            let mut c = 1u64;
            while c * c < count {
                c += 1;
            }
            let c = c as u32;
            (fill(c), c)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_shape_is_kept() {
        assert_eq!(auto_shape(Some(2), Some(5), 100), (2, 5));
        assert_eq!(auto_shape(Some(0), Some(5), 3), (0, 5));
    }

    #[test]
    fn test_one_side_given() {
        assert_eq!(auto_shape(Some(2), None, 7), (2, 4));
        assert_eq!(auto_shape(None, Some(3), 7), (3, 3));
        assert_eq!(auto_shape(None, Some(4), 4), (1, 4));
    }

    #[test]
    fn test_square_ish() {
        assert_eq!(auto_shape(None, None, 1), (1, 1));
        assert_eq!(auto_shape(None, None, 4), (2, 2));
        assert_eq!(auto_shape(None, None, 5), (2, 3));
        assert_eq!(auto_shape(None, None, 10), (3, 4));
        assert_eq!(auto_shape(None, None, 0), (1, 1));
    }
}
