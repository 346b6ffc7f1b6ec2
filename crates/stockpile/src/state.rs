//! Presentation state: the list, the add/edit dialog and the delete prompt.
//!
//! Holds no store handles; the [`SyncController`](crate::sync::SyncController) drives the
//! remote side and reads or clears this state around each call.

use crate::capture::{CaptureAdapter, CaptureError, CaptureState, CaptureSession, CapturedFrame};
use crate::error::SyncError;
use crate::item::{InventoryItem, MIN_SUBMIT_QUANTITY};
use crate::sync::SubmitRequest;
use crate::view::ListView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogMode {
    Adding,
    Editing { original: String },
}

/// The add/edit form. The camera, when open, belongs to the dialog and closes with it.
#[derive(Debug)]
pub struct EditDialog {
    pub mode: DialogMode,
    pub name: String,
    pub quantity: i64,
    pub staged_image: Option<CapturedFrame>,
    camera: Option<CaptureSession>,
}

impl EditDialog {
    pub fn add() -> Self {
        Self {
            mode: DialogMode::Adding,
            name: String::new(),
            quantity: MIN_SUBMIT_QUANTITY,
            staged_image: None,
            camera: None,
        }
    }

    pub fn edit(item: &InventoryItem) -> Self {
        Self {
            mode: DialogMode::Editing {
                original: item.name.clone(),
            },
            name: item.name.clone(),
            quantity: i64::from(item.quantity),
            staged_image: None,
            camera: None,
        }
    }

    pub fn original_name(&self) -> Option<&str> {
        match &self.mode {
            DialogMode::Adding => None,
            DialogMode::Editing { original } => Some(original),
        }
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty() && self.quantity >= MIN_SUBMIT_QUANTITY
    }

    pub fn camera_state(&self) -> CaptureState {
        self.camera
            .as_ref()
            .map_or(CaptureState::Idle, CaptureSession::state)
    }

    /// Start the camera for this dialog. A no-op if it is already streaming here.
    pub async fn open_camera(&mut self, adapter: &CaptureAdapter) -> Result<(), CaptureError> {
        if self.camera.as_ref().is_some_and(CaptureSession::is_active) {
            return Ok(());
        }
        self.camera = Some(adapter.start().await?);
        Ok(())
    }

    /// Snapshot the camera into `staged_image` and release the camera.
    pub fn take_snapshot(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<&CapturedFrame, CaptureError> {
        let Some(session) = self.camera.as_mut() else {
            return Err(CaptureError::InvalidState {
                op: "take a snapshot",
                state: CaptureState::Idle,
            });
        };
        let frame = session.capture_frame(width, height)?;
        self.camera = None;
        Ok(self.staged_image.insert(frame))
    }

    pub fn close_camera(&mut self) {
        self.camera = None;
    }

    pub fn discard_image(&mut self) {
        self.staged_image = None;
    }

    /// Drop the camera and any staged photo. Nothing staged is ever uploaded after this.
    pub fn cancel(&mut self) {
        self.close_camera();
        self.discard_image();
    }

    pub fn to_request(&self) -> SubmitRequest {
        SubmitRequest {
            original_name: self.original_name().map(str::to_string),
            new_name: self.name.clone(),
            quantity: self.quantity,
            staged_image: self.staged_image.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InventoryState {
    pub view: ListView,
    pub dialog: Option<EditDialog>,
    /// Name awaiting delete confirmation.
    pub pending_delete: Option<String>,
}

impl InventoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_add(&mut self) -> &mut EditDialog {
        self.replace_dialog(EditDialog::add())
    }

    /// Open the edit dialog for an item in the current listing.
    pub fn open_edit(&mut self, name: &str) -> Result<&mut EditDialog, SyncError> {
        let item = self
            .view
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(name.to_string()))?;
        Ok(self.replace_dialog(EditDialog::edit(&item)))
    }

    fn replace_dialog(&mut self, dialog: EditDialog) -> &mut EditDialog {
        self.close_dialog();
        self.dialog.insert(dialog)
    }

    pub fn close_dialog(&mut self) {
        if let Some(mut dialog) = self.dialog.take() {
            dialog.cancel();
        }
    }

    pub fn request_delete(&mut self, name: impl Into<String>) {
        self.pending_delete = Some(name.into());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.view.set_search(search);
    }
}
