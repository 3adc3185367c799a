//! Read model trait for back-office views.

/// A read model providing query access to rendered rows.
pub trait ReadModel: Send + Sync {
    /// Returns the name of this read model.
    fn name(&self) -> &'static str;

    /// Returns the number of rows in this read model.
    fn count(&self) -> usize;
}
