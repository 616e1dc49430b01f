//! Utility macros for reducing boilerplate.

/// Implements `FromRef<AppState>` for a state field, so handlers can use
/// `State<T>` extractors directly instead of always taking the whole
/// [`crate::state::AppState`].
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
