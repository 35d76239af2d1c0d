use std::sync::Arc;

use crate::call::CallHandle;
use crate::error::Result;
use crate::ids::LocationId;
use crate::model::Menu;
use crate::transport::Transport;

use super::not_found_as_none;

/// Menus resource.
#[derive(Debug, Clone)]
pub struct MenusResource {
    transport: Arc<Transport>,
}

impl MenusResource {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// List the menus of a location. `Ok(None)` if the location is unknown.
    pub async fn get_menus(&self, location_id: &str) -> Result<Option<Vec<Menu>>> {
        let id = LocationId::parse(location_id)?;
        tracing::debug!("Fetching menus for {}", id);
        not_found_as_none(
            self.transport
                .get_json(&format!("menus/v1/locations/{}/menus", id))
                .await,
        )
    }

    /// Callback form of [`get_menus`](Self::get_menus).
    pub fn get_menus_with<F>(&self, location_id: &str, callback: F) -> CallHandle
    where
        F: FnOnce(Result<Option<Vec<Menu>>>) + Send + 'static,
    {
        let resource = self.clone();
        let location_id = location_id.to_string();
        CallHandle::spawn(
            async move { resource.get_menus(&location_id).await },
            callback,
        )
    }
}
