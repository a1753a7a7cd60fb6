use serde::{Deserialize, Serialize};

use crate::cursor::PageToken;
use crate::model::User;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub users: Vec<User>,
    /// Pass back to [`UserRepository::list`](super::UserRepository::list) for
    /// the next page. `None` (and omitted from JSON) on the final page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_state: Option<PageToken>,
}

impl Page {
    pub fn is_last(&self) -> bool {
        self.next_page_state.is_none()
    }
}
