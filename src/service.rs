use crate::EntitledError;
use crate::compose::compose;
use crate::context::{GatherRequest, gather, now_ts};
use crate::settings::{Scope, TitleStore, persist_title};
use serde::Deserialize;
use std::path::PathBuf;

/// Notifications the host delivers when window state changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    ActiveEditorChanged {
        #[serde(default)]
        file: Option<PathBuf>,
    },
    WorkspaceChanged {
        #[serde(default)]
        workspace: Option<PathBuf>,
        #[serde(default)]
        name: Option<String>,
    },
    ConfigurationChanged,
    DocumentSaved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&str)>;

/// Keeps the window title in sync with host state.
///
/// The caller owns the lifecycle: construct, register listeners, feed
/// [`HostEvent`]s, then [`dispose`](Self::dispose) to restore the host
/// default title.
pub struct TitleService<S: TitleStore> {
    store: S,
    request: GatherRequest,
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    disposed: bool,
}

impl<S: TitleStore> TitleService<S> {
    pub fn new(mut store: S, request: GatherRequest) -> Self {
        store.set_workspace(request.workspace.as_deref());
        Self {
            store,
            request,
            listeners: Vec::new(),
            next_id: 0,
            disposed: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Register a callback invoked with every recomputed title, in
    /// registration order.
    pub fn on_title_update(&mut self, listener: impl FnMut(&str) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Apply a host notification and recompute the title. Returns `None`
    /// once the service has been disposed.
    pub fn handle_event(&mut self, event: HostEvent) -> Option<String> {
        if self.disposed {
            log::debug!("ignoring {event:?} after dispose");
            return None;
        }
        match event {
            HostEvent::ActiveEditorChanged { file } => self.request.active_file = file,
            HostEvent::WorkspaceChanged { workspace, name } => {
                self.store.set_workspace(workspace.as_deref());
                self.request.workspace = workspace;
                self.request.workspace_name = name;
            }
            HostEvent::ConfigurationChanged | HostEvent::DocumentSaved => {}
        }
        Some(self.update_title())
    }

    /// Compose the title for the current state without side effects.
    pub fn preview_title(&self) -> String {
        let fields = gather(&self.request, now_ts());
        let settings = self.store.title_settings();
        compose(
            &fields,
            settings.title_pattern.as_deref(),
            settings.enable_custom_title,
        )
    }

    /// Recompute, notify listeners, then persist. Persistence is best effort.
    pub fn update_title(&mut self) -> String {
        let title = self.preview_title();
        for (_, listener) in &mut self.listeners {
            listener(&title);
        }
        if let Err(e) = self.persist(&title) {
            log::warn!("failed to update window title: {e}");
        }
        title
    }

    /// Write `title` at the scope matching the current workspace, falling
    /// back to global. Returns the scope that took the write.
    pub fn persist(&mut self, title: &str) -> Result<Scope, EntitledError> {
        let scope = Scope::for_workspace(self.request.workspace.as_deref());
        persist_title(&mut self.store, title, scope)
    }

    /// Drop all listeners and restore the host default title. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.listeners.clear();

        let scope = Scope::for_workspace(self.request.workspace.as_deref());
        if let Err(e) = self.store.reset_title(scope) {
            log::warn!("failed to reset window title ({scope}): {e}");
        }
    }
}
