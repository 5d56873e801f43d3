use crate::error::BatchError;

/// Result of a single [`ItemReader::read`] call.
///
/// - `Ok(Some(item))`: an item was read
/// - `Ok(None)`: there is nothing left to read
/// - `Err(error)`: reading the item failed
pub type ItemReaderResult<I> = Result<Option<I>, BatchError>;

/// Retrieval of input for a step, one item at a time.
///
/// Readers keep their cursor behind interior mutability so a step can hold a
/// shared reference while it drives them.
pub trait ItemReader<I> {
    /// Reads the next item, or `Ok(None)` once the input is exhausted.
    ///
    /// Calling `read` again after `Ok(None)` keeps returning `Ok(None)`.
    fn read(&self) -> ItemReaderResult<I>;
}
