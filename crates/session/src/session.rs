//! One in-progress product edit.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value;

use maison_catalog::{Product, ProductParts, VariantKey};
use maison_core::{AggregateRoot, AssetId, Color, DomainError, DomainResult, ExpectedVersion, ProductId};
use maison_media::{MediaAsset, MediaKind};

use crate::gateway::{CommitSnapshot, MediaReconcilePayload, NewMediaFile, PersistenceGateway};

/// Where an edit session stands.
///
/// `Draft` and `Editing` differ only in whether a prior durable snapshot
/// exists to reconcile against; `Failed` preserves the draft so the
/// operator can correct and resubmit without re-entering anything.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Brand-new product, nothing persisted yet.
    Draft,
    /// Hydrated from a persisted snapshot.
    Editing,
    /// Snapshot accepted by the store; the session is closed.
    Committed,
    /// The store rejected the last commit; draft preserved, editable.
    Failed,
}

/// Commands the surrounding UI issues against a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Rename(String),
    SetDescription(String),
    /// Price in smallest currency unit (e.g., cents).
    SetPrice(u64),
    SetCategory(String),
    SetCollection(String),
    SetStock(u32),
    AddColor(String),
    RemoveColor(String),
    StageVariant {
        color: Option<String>,
        size: String,
        quantity: u32,
        /// Identity of the entry being edited in place, when this is an
        /// edit rather than an add.
        editing: Option<VariantKey>,
    },
    RemoveVariant(VariantKey),
    AddMeasurementField(String),
    RemoveMeasurementField(String),
    UpsertSizeGuideRow {
        size: String,
        values: BTreeMap<String, String>,
        editing: Option<usize>,
    },
    RemoveSizeGuideRow(usize),
    /// Stage a newly uploaded file (handle + color tag, never bytes).
    StageMedia {
        handle: String,
        kind: MediaKind,
        color: Option<String>,
    },
    /// Set or clear the color tag on a staged or existing asset.
    AssignMediaColor {
        asset: AssetId,
        color: Option<String>,
    },
    /// When set, commit discards all previously persisted media in favor
    /// of what this session staged.
    SetReplaceAllMedia(bool),
    SetDiscount(Option<Value>),
    SetVoucher(Option<Value>),
}

/// State machine over one product edit session.
#[derive(Debug)]
pub struct EditSession {
    product: Product,
    staged_media: Vec<MediaAsset>,
    color_overrides: HashMap<AssetId, Option<Color>>,
    replace_all_media: bool,
    hydrated: bool,
    state: SessionState,
    last_rejection: Option<DomainError>,
}

impl EditSession {
    /// Start a session for a brand-new product.
    pub fn new_product(id: ProductId, now: DateTime<Utc>) -> Self {
        Self {
            product: Product::new(id, now),
            staged_media: Vec::new(),
            color_overrides: HashMap::new(),
            replace_all_media: false,
            hydrated: false,
            state: SessionState::Draft,
            last_rejection: None,
        }
    }

    /// Resume editing a persisted product. Hydration runs the defensive
    /// consolidation pass, so an upstream-corrupted snapshot comes back
    /// consistent.
    pub fn resume(parts: ProductParts) -> Self {
        Self {
            product: Product::hydrate(parts),
            staged_media: Vec::new(),
            color_overrides: HashMap::new(),
            replace_all_media: false,
            hydrated: true,
            state: SessionState::Editing,
            last_rejection: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn staged_media(&self) -> &[MediaAsset] {
        &self.staged_media
    }

    /// The store's verbatim error from the last failed commit, if any.
    pub fn last_rejection(&self) -> Option<&DomainError> {
        self.last_rejection.as_ref()
    }

    /// Apply one command. Validation failures leave the session state and
    /// draft untouched; they are reported for correction, never retried.
    pub fn apply(&mut self, command: SessionCommand) -> DomainResult<()> {
        if self.state == SessionState::Committed {
            return Err(DomainError::SessionClosed);
        }
        let result = self.dispatch(command);
        if let Err(err) = &result {
            tracing::debug!(product = %self.product.id(), error = %err, "command rejected");
        }
        result
    }

    fn dispatch(&mut self, command: SessionCommand) -> DomainResult<()> {
        match command {
            SessionCommand::Rename(name) => self.product.set_name(&name),
            SessionCommand::SetDescription(text) => {
                self.product.set_description(text);
                Ok(())
            }
            SessionCommand::SetPrice(price) => {
                self.product.set_price(price);
                Ok(())
            }
            SessionCommand::SetCategory(category) => {
                self.product.set_category(category);
                Ok(())
            }
            SessionCommand::SetCollection(collection) => {
                self.product.set_collection(collection);
                Ok(())
            }
            SessionCommand::SetStock(stock) => self.product.set_stock(stock),
            SessionCommand::AddColor(label) => {
                let color = Color::parse(&label)?;
                self.product.add_color(color);
                Ok(())
            }
            SessionCommand::RemoveColor(label) => {
                let color = Color::parse(&label)?;
                self.product.remove_color(&color);
                Ok(())
            }
            SessionCommand::StageVariant {
                color,
                size,
                quantity,
                editing,
            } => {
                let color = color.as_deref().map(Color::parse).transpose()?;
                self.product
                    .upsert_variant(color, &size, quantity, editing.as_ref())
            }
            SessionCommand::RemoveVariant(key) => {
                self.product.remove_variant(&key);
                Ok(())
            }
            SessionCommand::AddMeasurementField(name) => self.product.add_measurement_field(&name),
            SessionCommand::RemoveMeasurementField(name) => {
                self.product.remove_measurement_field(&name);
                Ok(())
            }
            SessionCommand::UpsertSizeGuideRow {
                size,
                values,
                editing,
            } => self.product.upsert_size_guide_row(&size, values, editing),
            SessionCommand::RemoveSizeGuideRow(index) => self.product.remove_size_guide_row(index),
            SessionCommand::StageMedia {
                handle,
                kind,
                color,
            } => {
                let color = color.as_deref().map(Color::parse).transpose()?;
                let order = (self.product.media().len() + self.staged_media.len()) as u32;
                let asset = MediaAsset::new(handle, kind, color, order)?;
                self.staged_media.push(asset);
                Ok(())
            }
            SessionCommand::AssignMediaColor { asset, color } => {
                let color = color.as_deref().map(Color::parse).transpose()?;
                // Staged assets carry their tag directly; reassigning an
                // existing asset is also recorded for the store.
                if maison_media::assign_color(&mut self.staged_media, asset, color.clone()).is_ok()
                {
                    return Ok(());
                }
                self.product.assign_media_color(asset, color.clone())?;
                self.color_overrides.insert(asset, color);
                Ok(())
            }
            SessionCommand::SetReplaceAllMedia(replace) => {
                self.replace_all_media = replace;
                Ok(())
            }
            SessionCommand::SetDiscount(discount) => {
                self.product.set_discount(discount);
                Ok(())
            }
            SessionCommand::SetVoucher(voucher) => {
                self.product.set_voucher(voucher);
                Ok(())
            }
        }
    }

    /// Assemble and submit the final snapshot.
    ///
    /// Runs the defensive consolidation pass, reconciles media, and hands
    /// the result to the gateway. Acceptance closes the session; rejection
    /// moves it to [`SessionState::Failed`] with the store's error surfaced
    /// verbatim and the whole draft intact for correction and resubmission.
    pub fn commit(&mut self, gateway: &dyn PersistenceGateway) -> DomainResult<u64> {
        if self.state == SessionState::Committed {
            return Err(DomainError::SessionClosed);
        }
        if self.product.name().trim().is_empty() {
            return Err(DomainError::empty("name"));
        }

        self.product.consolidate_variants();
        let reconciled = maison_media::reconcile(
            self.product.media().to_vec(),
            self.staged_media.clone(),
            &self.color_overrides,
            self.replace_all_media,
        );

        let snapshot = CommitSnapshot::from_product(&self.product);
        let payload = self.media_payload();
        let expected = if self.hydrated {
            ExpectedVersion::Exact(self.product.version())
        } else {
            ExpectedVersion::Any
        };

        match gateway.persist(&snapshot, &payload, expected) {
            Ok(revision) => {
                self.product.set_media(reconciled);
                self.product.set_version(revision);
                self.staged_media.clear();
                self.color_overrides.clear();
                self.replace_all_media = false;
                self.state = SessionState::Committed;
                self.last_rejection = None;
                tracing::info!(product = %self.product.id(), revision, "catalog entry committed");
                Ok(revision)
            }
            Err(err) => {
                self.state = SessionState::Failed;
                self.last_rejection = Some(err.clone());
                tracing::warn!(
                    product = %self.product.id(),
                    error = %err,
                    "commit rejected; draft preserved"
                );
                Err(err)
            }
        }
    }

    /// Abandon the draft. Always safe: no external resource is held while
    /// editing.
    pub fn discard(self) {}

    fn media_payload(&self) -> MediaReconcilePayload {
        MediaReconcilePayload {
            new_files: self
                .staged_media
                .iter()
                .map(|a| NewMediaFile {
                    handle: a.url().to_string(),
                    kind: a.kind(),
                    color: a.color().map(|c| c.to_string()),
                })
                .collect(),
            existing_color_overrides: self
                .color_overrides
                .iter()
                .map(|(id, color)| (*id, color.as_ref().map(|c| c.to_string())))
                .collect(),
            replace_all: self.replace_all_media,
        }
    }
}
