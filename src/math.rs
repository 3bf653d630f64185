
//! Grid arithmetic for the level pyramid.
//! The coarsening rule matches the node-centered multigrid hierarchy:
//! a dimension of extent `n` coarsens to `n / 2 + 1` nodes.

use smallvec::SmallVec;


/// The extents of an n-dimensional array, outermost dimension first.
pub type Dimensions = SmallVec<[u32; 4]>;


/// Computes `floor(log(x)/log(2))`.
pub fn floor_log_2(mut number: u32) -> u32 {
    debug_assert_ne!(number, 0);

    let mut log = 0;
    while number > 1 {
        log += 1;
        number >>= 1;
    }

    log
}

/// The deepest target level a grid of these dimensions supports.
/// Returns `None` if any dimension is too small to be coarsened even once.
pub fn max_target_level(dimensions: &[u32]) -> Option<u8> {
    let smallest = dimensions.iter().cloned().min().filter(|&extent| extent != 0)?;
    floor_log_2(smallest).checked_sub(1).map(|level| level as u8)
}

/// Number of nodes that remain when one coarsening pass is applied to a dimension.
pub fn coarsen_extent(extent: u32) -> u32 {
    extent / 2 + 1
}

/// The grid extents of every level, index `0` being the coarsest level
/// and index `target_level` being the full input grid.
pub fn level_dimensions(dimensions: &[u32], target_level: u8) -> Vec<Dimensions> {
    let level_count = target_level as usize + 1;
    let mut levels = vec![Dimensions::from_slice(dimensions); level_count];

    for level in (0 .. level_count - 1).rev() {
        let finer = levels[level + 1].clone();
        levels[level] = finer.iter().map(|&extent| coarsen_extent(extent)).collect();
    }

    levels
}

/// Number of elements in a grid of these dimensions.
pub fn element_count(dimensions: &[u32]) -> u64 {
    dimensions.iter().map(|&extent| extent as u64).product()
}

/// Number of coefficients each level contributes:
/// the elements of its grid minus the elements of the embedded coarser grid.
pub fn level_element_counts(level_dimensions: &[Dimensions]) -> Vec<u64> {
    let mut counts = Vec::with_capacity(level_dimensions.len());
    let mut embedded = 0;

    for dimensions in level_dimensions {
        let total = element_count(dimensions);
        counts.push(total - embedded);
        embedded = total;
    }

    counts
}

/// Row-major strides of a grid, in elements. The innermost dimension is contiguous.
pub fn strides(dimensions: &[u32]) -> SmallVec<[usize; 4]> {
    let mut strides: SmallVec<[usize; 4]> = SmallVec::with_capacity(dimensions.len());
    let mut stride = 1_usize;

    for &extent in dimensions.iter().rev() {
        strides.push(stride);
        stride *= extent as usize;
    }

    strides.reverse();
    strides
}

/// The exponent `e` with `|value|` inside `[2^(e-1), 2^e)`, as `frexp` defines it.
/// Returns `0` for zero input.
pub fn frexp_exponent(value: f64) -> i32 {
    let abs = value.abs();
    if abs == 0.0 { return 0; }

    let biased = ((abs.to_bits() >> 52) & 0x7ff) as i32;
    if biased == 0 {
        // subnormal, normalize before reading the exponent field
        return frexp_exponent(abs * (64_f64).exp2()) - 64;
    }

    biased - 1022
}

/// Multiplies the value by `2^exponent`, like `ldexp`.
pub fn shift_exponent(value: f64, exponent: i32) -> f64 {
    value * (exponent as f64).exp2()
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn logarithms(){
        assert_eq!(floor_log_2(1), 0);
        assert_eq!(floor_log_2(2), 1);
        assert_eq!(floor_log_2(3), 1);
        assert_eq!(floor_log_2(16), 4);
        assert_eq!(floor_log_2(17), 4);
    }

    #[test]
    fn deepest_level(){
        assert_eq!(max_target_level(&[16, 16, 16]), Some(3));
        assert_eq!(max_target_level(&[16, 4]), Some(1));
        assert_eq!(max_target_level(&[3]), Some(0));
        assert_eq!(max_target_level(&[1, 16]), None);
        assert_eq!(max_target_level(&[0]), None);
        assert_eq!(max_target_level(&[]), None);
    }

    #[test]
    fn pyramid_of_cube(){
        let levels = level_dimensions(&[16, 16, 16], 2);
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].as_slice(), &[5, 5, 5]);
        assert_eq!(levels[1].as_slice(), &[9, 9, 9]);
        assert_eq!(levels[2].as_slice(), &[16, 16, 16]);

        let counts = level_element_counts(&levels);
        assert_eq!(counts, vec![125, 729 - 125, 4096 - 729]);
    }

    #[test]
    fn pyramid_of_uneven_grid(){
        let levels = level_dimensions(&[115, 288], 1);
        assert_eq!(levels[1].as_slice(), &[115, 288]);
        assert_eq!(levels[0].as_slice(), &[58, 145]);
    }

    #[test]
    fn row_major_strides(){
        assert_eq!(strides(&[4, 3, 2]).as_slice(), &[6, 2, 1]);
        assert_eq!(strides(&[7]).as_slice(), &[1]);
    }

    #[test]
    fn exponents(){
        assert_eq!(frexp_exponent(1.0), 1);
        assert_eq!(frexp_exponent(0.99), 0);
        assert_eq!(frexp_exponent(4.0), 3);
        assert_eq!(frexp_exponent(-6.0), 3);
        assert_eq!(frexp_exponent(0.25), -1);
        assert_eq!(frexp_exponent(0.0), 0);

        assert_eq!(shift_exponent(1.0, 3), 8.0);
        assert_eq!(shift_exponent(12.0, -2), 3.0);
    }
}
