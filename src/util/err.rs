/// Converts errors from their error type (of the submodule) to that of
/// a rastro::Error variant.
///
/// ```rust,ignore
/// use rastro::store::StoreError;
/// rastro::impl_err!(StoreError, Store);
/// ```
pub mod err_macro {
    #[macro_export]
    macro_rules! impl_err {
        ($from:ty, $variant:ident) => {
            impl From<$from> for $crate::Error {
                fn from(value: $from) -> Self {
                    $crate::Error::$variant(value)
                }
            }
        };
    }

    pub use impl_err;
}
