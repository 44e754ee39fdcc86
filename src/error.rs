use thiserror::Error;

/// Errors returned by the handle-based `try_*` operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeakSetError {
    /// The weak handle could not be resolved, so there is no identity to track.
    #[error("{operation}: weak handle does not refer to a live object")]
    DanglingHandle { operation: &'static str },
}

impl WeakSetError {
    pub(crate) fn dangling(operation: &'static str) -> Self {
        WeakSetError::DanglingHandle { operation }
    }
}

#[cfg(test)]
mod tests {
    use super::WeakSetError;

    #[test]
    fn message_names_operation() {
        let e = WeakSetError::dangling("try_insert");
        assert_eq!(
            e.to_string(),
            "try_insert: weak handle does not refer to a live object"
        );
    }
}
