use crate::utils::error::{ConvertError, ConvertResult};

pub(crate) trait SafeAccess<T> {
    fn get_safe(&self, index: usize) -> ConvertResult<&T>;
}

impl<T> SafeAccess<T> for [T] {
    /// Safely retrieves a reference to an element at the specified index in a slice.
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the element to retrieve.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::Format` if the index is out of bounds.
    fn get_safe(&self, index: usize) -> ConvertResult<&T> {
        self.get(index).ok_or_else(|| {
            ConvertError::format(format!("index {} out of bounds (len {})", index, self.len()))
        })
    }
}
