use crate::utils::error::{ChromaError, ChromaResult};

pub(crate) trait SafeAccess<T> {
    fn get_safe(&self, index: usize) -> ChromaResult<&T>;
    fn get_range_safe(&self, range: std::ops::Range<usize>) -> ChromaResult<&[T]>;
    fn check_range(&self, range: std::ops::Range<usize>) -> ChromaResult<()>;
}

impl<T> SafeAccess<T> for [T] {
    /// Safely retrieves a reference to an element at the specified index in a slice.
    ///
    /// # Errors
    ///
    /// Returns `ChromaError::TruncatedData` if the index is past the end of the slice.
    fn get_safe(&self, index: usize) -> ChromaResult<&T> {
        self.get(index).ok_or(ChromaError::TruncatedData {
            expected: index + 1,
            actual: self.len(),
        })
    }

    /// Safely retrieves a reference to a range of elements in a slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is inverted or ends past the slice.
    fn get_range_safe(&self, range: std::ops::Range<usize>) -> ChromaResult<&[T]> {
        self.check_range(range.clone())?;

        Ok(&self[range])
    }

    /// Checks if a range is valid for this slice without actually retrieving the elements.
    ///
    /// # Errors
    ///
    /// - `ChromaError::Custom` if the range start is greater than the range end
    /// - `ChromaError::TruncatedData` if the range end is greater than the slice length
    fn check_range(&self, range: std::ops::Range<usize>) -> ChromaResult<()> {
        if range.start > range.end {
            return Err(ChromaError::Custom(format!(
                "Invalid range: start ({}) > end ({})",
                range.start, range.end
            )));
        }

        if range.end > self.len() {
            return Err(ChromaError::TruncatedData {
                expected: range.end,
                actual: self.len(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_access() {
        let data = [1u8, 2, 3];

        assert_eq!(*data.get_safe(2).unwrap(), 3);
        assert!(matches!(
            data.get_safe(3),
            Err(ChromaError::TruncatedData { expected: 4, actual: 3 })
        ));
        assert_eq!(data.get_range_safe(1..3).unwrap(), &[2, 3]);
        assert!(data.check_range(0..4).is_err());
        assert!(data.check_range(2..1).is_err());
    }
}
