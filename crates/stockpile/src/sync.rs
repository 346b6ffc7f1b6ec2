//! Sync controller: turns user actions into ordered record store and blob store calls.
//!
//! Every action is a straight sequence of awaited steps with no retries or timeouts:
//!
//! 1. validate locally (nothing remote happens for bad input)
//! 2. upload the staged photo, if any, under the new name
//! 3. for a rename, move the record per [`RenameOrder`]
//! 4. merge-write `{quantity, imageUrl?}` under the new name
//! 5. re-list the collection into the [`ListView`]
//!
//! A photo that fails to upload does not fail the submit; the item is saved without it and the
//! outcome says so. A refresh that fails after a successful write is reported as
//! `refreshed: false` rather than as an error, since the write itself stands.
//!
//! With the default `DeleteFirst` order a rename that fails between its two writes loses the
//! item. `WriteFirst` refuses names that are already taken and undoes the new record when the
//! old one cannot be deleted.

use std::sync::Arc;

use stockconf::{RenameImagePolicy, RenameOrder, SyncConfig};
use tracing::{debug, error, info, instrument, warn};

use crate::capture::CapturedFrame;
use crate::error::{SyncError, ValidationError};
use crate::item::{validate_submission, ItemFields};
use crate::records::{RecordStore, WriteMode};
use crate::state::InventoryState;
use crate::upload::{ImageUploader, UploadOutcome};
use crate::view::ListView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncPolicy {
    pub rename_order: RenameOrder,
    pub rename_image: RenameImagePolicy,
}

impl From<&SyncConfig> for SyncPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            rename_order: config.rename_order,
            rename_image: config.rename_image,
        }
    }
}

/// One add or edit, as submitted from the dialog or the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    /// Key of the record being edited. `None` for a new item.
    pub original_name: Option<String>,
    pub new_name: String,
    pub quantity: i64,
    pub staged_image: Option<CapturedFrame>,
}

impl SubmitRequest {
    pub fn create(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            original_name: None,
            new_name: name.into(),
            quantity,
            staged_image: None,
        }
    }

    pub fn edit(original: impl Into<String>, name: impl Into<String>, quantity: i64) -> Self {
        Self {
            original_name: Some(original.into()),
            ..Self::create(name, quantity)
        }
    }

    pub fn with_image(mut self, frame: CapturedFrame) -> Self {
        self.staged_image = Some(frame);
        self
    }
}

/// What happened to the item's photo during a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// No photo was staged; the stored `imageUrl` was left alone.
    Unchanged,
    Attached { url: String },
    /// Renamed without a new photo; the old URL was copied onto the new record.
    CarriedForward { url: String },
    /// The photo could not be stored; the item was saved without it.
    UploadFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub name: String,
    pub renamed_from: Option<String>,
    pub image: ImageOutcome,
    pub refreshed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub existed: bool,
    pub refreshed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustOutcome {
    pub name: String,
    pub quantity: u32,
    pub refreshed: bool,
}

pub struct SyncController {
    records: Arc<dyn RecordStore>,
    uploader: ImageUploader,
    policy: SyncPolicy,
}

impl SyncController {
    pub fn new(records: Arc<dyn RecordStore>, uploader: ImageUploader, policy: SyncPolicy) -> Self {
        Self {
            records,
            uploader,
            policy,
        }
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    #[instrument(
        skip(self, view, request),
        fields(item.name = %request.new_name, original = ?request.original_name)
    )]
    pub async fn submit(
        &self,
        view: &mut ListView,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome, SyncError> {
        let (name, quantity) = validate_submission(&request.new_name, request.quantity)?;
        let renamed_from = request
            .original_name
            .filter(|original| *original != name);

        if let Some(original) = &renamed_from {
            if self.policy.rename_order == RenameOrder::WriteFirst
                && self.records.get(&name).await?.is_some()
            {
                warn!(from = %original, to = %name, "rename target already exists");
                return Err(SyncError::NameTaken(name));
            }
        }

        let mut image = ImageOutcome::Unchanged;
        let mut image_url = None;
        if let Some(frame) = &request.staged_image {
            match self.uploader.encode_and_upload(frame, &name).await {
                UploadOutcome::Stored { url, .. } => {
                    image_url = Some(url.clone());
                    image = ImageOutcome::Attached { url };
                }
                UploadOutcome::NoUrl(reason) => image = ImageOutcome::UploadFailed { reason },
            }
        }

        let carry_forward = self.policy.rename_image == RenameImagePolicy::CarryForward;
        if let Some(original) = &renamed_from {
            if image_url.is_none() && carry_forward {
                let previous = self.records.get(original).await?;
                if let Some(url) = previous.and_then(|item| item.image_url) {
                    debug!(from = %original, url = %url, "carrying photo over to renamed item");
                    if image == ImageOutcome::Unchanged {
                        image = ImageOutcome::CarriedForward { url: url.clone() };
                    }
                    image_url = Some(url);
                }
            }
        }

        let fields = ItemFields::quantity(quantity).with_image_url(image_url);
        match &renamed_from {
            Some(original) => self.rename(original, &name, fields).await?,
            None => self.records.put(&name, fields, WriteMode::Merge).await?,
        }

        info!(item.name = %name, quantity, renamed = renamed_from.is_some(), "item saved");
        let refreshed = self.refresh_after_write(view).await;
        Ok(SubmitOutcome {
            name,
            renamed_from,
            image,
            refreshed,
        })
    }

    async fn rename(
        &self,
        original: &str,
        name: &str,
        fields: ItemFields,
    ) -> Result<(), SyncError> {
        match self.policy.rename_order {
            RenameOrder::DeleteFirst => {
                self.records.delete(original).await?;
                self.records.put(name, fields, WriteMode::Merge).await?;
            }
            RenameOrder::WriteFirst => {
                self.records.put(name, fields, WriteMode::Merge).await?;
                if let Err(e) = self.records.delete(original).await {
                    warn!(
                        from = %original,
                        to = %name,
                        error = %e,
                        "old record not deleted, undoing rename"
                    );
                    if let Err(undo) = self.records.delete(name).await {
                        error!(
                            from = %original,
                            to = %name,
                            error = %undo,
                            "could not undo rename, both records exist"
                        );
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Re-list the whole collection into `view`.
    #[instrument(skip_all)]
    pub async fn refresh(&self, view: &mut ListView) -> Result<(), SyncError> {
        let items = self.records.list().await?;
        debug!(count = items.len(), "refreshed inventory");
        view.replace(items);
        Ok(())
    }

    async fn refresh_after_write(&self, view: &mut ListView) -> bool {
        match self.refresh(view).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "write succeeded but refresh failed, view is stale");
                false
            }
        }
    }

    /// Delete `name` and refresh. Removing an absent item is a no-op.
    #[instrument(skip(self, view), fields(item.name = %name))]
    pub async fn remove(
        &self,
        view: &mut ListView,
        name: &str,
    ) -> Result<RemoveOutcome, SyncError> {
        let existed = self.records.delete(name).await?;
        if existed {
            info!(item.name = %name, "item removed");
        }
        let refreshed = self.refresh_after_write(view).await;
        Ok(RemoveOutcome { existed, refreshed })
    }

    /// Add `delta` to an item's quantity. The result may be zero but not negative.
    #[instrument(skip(self, view), fields(item.name = %name))]
    pub async fn adjust_quantity(
        &self,
        view: &mut ListView,
        name: &str,
        delta: i64,
    ) -> Result<AdjustOutcome, SyncError> {
        let item = self
            .records
            .get(name)
            .await?
            .ok_or_else(|| SyncError::NotFound(name.to_string()))?;

        let target = i64::from(item.quantity).saturating_add(delta);
        if target < 0 {
            return Err(ValidationError::QuantityTooLow { min: 0, got: target }.into());
        }
        let quantity = u32::try_from(target).map_err(|_| ValidationError::QuantityTooHigh(target))?;

        self.records
            .put(name, ItemFields::quantity(quantity), WriteMode::Merge)
            .await?;
        info!(item.name = %name, quantity, delta, "quantity adjusted");

        let refreshed = self.refresh_after_write(view).await;
        Ok(AdjustOutcome {
            name: name.to_string(),
            quantity,
            refreshed,
        })
    }

    /// Submit the open dialog. On success the dialog closes; on error it stays open untouched.
    /// `Ok(None)` when no dialog is open.
    pub async fn submit_dialog(
        &self,
        state: &mut InventoryState,
    ) -> Result<Option<SubmitOutcome>, SyncError> {
        let Some(dialog) = &state.dialog else {
            return Ok(None);
        };
        let request = dialog.to_request();
        let outcome = self.submit(&mut state.view, request).await?;
        state.close_dialog();
        Ok(Some(outcome))
    }

    /// Delete the item held by the pending delete prompt, then clear the prompt.
    /// On error the prompt stays so the user can retry or cancel.
    pub async fn confirm_delete(
        &self,
        state: &mut InventoryState,
    ) -> Result<Option<RemoveOutcome>, SyncError> {
        let Some(name) = state.pending_delete.clone() else {
            return Ok(None);
        };
        let outcome = self.remove(&mut state.view, &name).await?;
        state.pending_delete = None;
        Ok(Some(outcome))
    }
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("uploader", &self.uploader)
            .field("policy", &self.policy)
            .finish()
    }
}
