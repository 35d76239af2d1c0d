use std::sync::Arc;

use crate::call::CallHandle;
use crate::error::Result;
use crate::ids::LocationId;
use crate::model::Location;
use crate::transport::Transport;

use super::not_found_as_none;

/// Business resource: locations and their profile data.
#[derive(Debug, Clone)]
pub struct BusinessResource {
    transport: Arc<Transport>,
}

impl BusinessResource {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Fetch a location by its `BL-XXXX-XXXX-XXXX` identifier.
    ///
    /// A malformed identifier fails with a validation error before any
    /// request is made. Returns `Ok(None)` if the location does not exist.
    pub async fn get_location(&self, location_id: &str) -> Result<Option<Location>> {
        let id = LocationId::parse(location_id)?;
        tracing::debug!("Fetching location {}", id);
        not_found_as_none(
            self.transport
                .get_json(&format!("business/v1/locations/{}", id))
                .await,
        )
    }

    /// Callback form of [`get_location`](Self::get_location).
    pub fn get_location_with<F>(&self, location_id: &str, callback: F) -> CallHandle
    where
        F: FnOnce(Result<Option<Location>>) + Send + 'static,
    {
        let resource = self.clone();
        let location_id = location_id.to_string();
        CallHandle::spawn(
            async move { resource.get_location(&location_id).await },
            callback,
        )
    }
}
