use quill_authors::ListAuthorsPermission;
use quill_infra::NewsroomStore;

/// Shared per-process state handed to every handler.
pub struct Services<S> {
    pub store: S,
    pub list_authors: ListAuthorsPermission,
}

impl<S: NewsroomStore> Services<S> {
    pub fn new(store: S, admin_panel_agent_name: impl Into<String>) -> Self {
        Self {
            store,
            list_authors: ListAuthorsPermission::new(admin_panel_agent_name),
        }
    }
}
