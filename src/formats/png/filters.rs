//! Per-scanline predictive filters.
//!
//! Every filter works on a fixed byte stride: the number of bytes between a
//! byte and its "left" neighbour. Encoding always uses 4 (RGBA8); decoding
//! uses whatever the header's color type and bit depth imply.

use crate::utils::error::{ChromaError, ChromaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    /// All filter kinds, in tag order.
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FilterType {
    type Error = ChromaError;

    fn try_from(value: u8) -> ChromaResult<Self> {
        match value {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            n => Err(ChromaError::UnknownFilterType(n)),
        }
    }
}

/// How the encoder picks a filter for each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterStrategy {
    /// Try every filter and keep the one with the lowest residual score.
    #[default]
    Adaptive,
    /// Use the same filter for every row.
    Fixed(FilterType),
}

pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    // a = left, b = above, c = upper left
    let a = a as i16;
    let b = b as i16;
    let c = c as i16;

    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

#[inline]
fn predict(filter: FilterType, left: u8, above: u8, upper_left: u8) -> u8 {
    match filter {
        FilterType::None => 0,
        FilterType::Sub => left,
        FilterType::Up => above,
        FilterType::Average => ((left as u16 + above as u16) >> 1) as u8,
        FilterType::Paeth => paeth_predictor(left, above, upper_left),
    }
}

/// Reverses one filtered byte given its already reconstructed neighbours.
#[inline]
pub fn unfilter_byte(filter: FilterType, value: u8, left: u8, above: u8, upper_left: u8) -> u8 {
    value.wrapping_add(predict(filter, left, above, upper_left))
}

/// Applies `filter` to `row`, writing residuals (no tag byte) into `out`.
///
/// `prior` is the previous raw row; pass zeros for the first row.
pub fn filter_row(filter: FilterType, row: &[u8], prior: &[u8], stride: usize, out: &mut [u8]) {
    debug_assert_eq!(row.len(), prior.len());
    debug_assert_eq!(row.len(), out.len());

    if filter == FilterType::None {
        out.copy_from_slice(row);
        return;
    }

    for i in 0..row.len() {
        let left = if i >= stride { row[i - stride] } else { 0 };
        let upper_left = if i >= stride { prior[i - stride] } else { 0 };

        out[i] = row[i].wrapping_sub(predict(filter, left, prior[i], upper_left));
    }
}

/// Reconstructs a raw row from residuals, left to right.
pub fn unfilter_row(filter: FilterType, filtered: &[u8], prior: &[u8], stride: usize, out: &mut [u8]) {
    debug_assert_eq!(filtered.len(), prior.len());
    debug_assert_eq!(filtered.len(), out.len());

    for i in 0..filtered.len() {
        let left = if i >= stride { out[i - stride] } else { 0 };
        let upper_left = if i >= stride { prior[i - stride] } else { 0 };

        out[i] = unfilter_byte(filter, filtered[i], left, prior[i], upper_left);
    }
}

/// Filters `row` and returns it prefixed with the filter tag.
pub fn encode(filter: FilterType, row: &[u8], prior: &[u8], stride: usize) -> Vec<u8> {
    let mut out = vec![0u8; row.len() + 1];
    out[0] = filter.tag();
    filter_row(filter, row, prior, stride, &mut out[1..]);

    out
}

/// Reverses `filter` on an untagged residual row.
pub fn decode(filter: FilterType, filtered: &[u8], prior: &[u8], stride: usize) -> Vec<u8> {
    let mut out = vec![0u8; filtered.len()];
    unfilter_row(filter, filtered, prior, stride, &mut out);

    out
}

/// Sum of absolute residuals, treating bytes as signed under wraparound.
pub fn score(residuals: &[u8]) -> u64 {
    residuals
        .iter()
        .map(|&b| if b < 128 { b as u64 } else { 256 - b as u64 })
        .sum()
}

/// Encoder-side filter selection with reusable scratch rows.
pub struct RowFilter {
    stride: usize,
    strategy: FilterStrategy,
    candidates: [Vec<u8>; 5],
}

impl RowFilter {
    pub fn new(row_len: usize, stride: usize, strategy: FilterStrategy) -> Self {
        Self {
            stride,
            strategy,
            candidates: std::array::from_fn(|_| vec![0u8; row_len]),
        }
    }

    /// Filters `row` against `prior` and appends the tagged result to `out`.
    ///
    /// Under the adaptive strategy ties go to the lowest filter tag.
    pub fn apply(&mut self, row: &[u8], prior: &[u8], out: &mut Vec<u8>) -> FilterType {
        let chosen = match self.strategy {
            FilterStrategy::Fixed(filter) => {
                filter_row(filter, row, prior, self.stride, &mut self.candidates[filter as usize]);
                filter
            }
            FilterStrategy::Adaptive => {
                let mut best = FilterType::None;
                let mut best_score = u64::MAX;

                for filter in FilterType::ALL {
                    let candidate = &mut self.candidates[filter as usize];
                    filter_row(filter, row, prior, self.stride, candidate);

                    let candidate_score = score(candidate);
                    if candidate_score < best_score {
                        best_score = candidate_score;
                        best = filter;
                    }
                }

                best
            }
        };

        out.push(chosen.tag());
        out.extend_from_slice(&self.candidates[chosen as usize]);

        chosen
    }
}
