//! Typed façades over the [`Transport`](crate::Transport), one per API
//! resource family.
//!
//! Each operation comes in two shapes that share one implementation:
//! an `async fn` returning the result, and a `*_with` variant taking a
//! completion callback and returning a [`CallHandle`](crate::CallHandle).
//! `Ok(None)` means the resource was not found or the API returned nothing.

mod business;
mod menus;

pub use business::BusinessResource;
pub use menus::MenusResource;

use crate::error::{Result, SpotOnError};

/// Turn a 404 into "no data".
fn not_found_as_none<T>(result: Result<Option<T>>) -> Result<Option<T>> {
    match result {
        Err(SpotOnError::Api { status: 404, .. }) => Ok(None),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_as_none() {
        let not_found: Result<Option<u8>> = Err(SpotOnError::Api {
            status: 404,
            code: None,
            message: "Not Found".to_string(),
            details: None,
        });
        assert!(not_found_as_none(not_found).unwrap().is_none());

        let forbidden: Result<Option<u8>> = Err(SpotOnError::Api {
            status: 403,
            code: None,
            message: "Forbidden".to_string(),
            details: None,
        });
        assert!(not_found_as_none(forbidden).is_err());

        assert_eq!(not_found_as_none(Ok(Some(1u8))).unwrap(), Some(1));
    }
}
