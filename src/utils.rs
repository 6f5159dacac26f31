//! # Utility Functions Module
//!
//! Helper per costruire argv di tool esterni senza boilerplate di
//! `.to_string()` ripetuti.

/// Converts an iterable of string-like items to `Vec<String>`.
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Convenience macro over [`to_string_vec`] for building command arguments.
///
/// ```rust
/// use haraj_publisher::args;
///
/// let seek = 0.5;
/// let argv = args!["-ss", seek, "-frames:v", 1];
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item.to_string()),*])
    };
}
