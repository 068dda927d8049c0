//! Commit payloads and the persistence boundary.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use maison_catalog::Product;
use maison_core::{
    AggregateRoot, AssetId, DomainError, DomainResult, ExpectedVersion, ProductId,
};
use maison_media::MediaKind;

/// One variant as the store sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPayload {
    pub color: Option<String>,
    pub size: String,
    pub quantity: u32,
}

/// One size-guide row; measurement fields flatten into the row object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeGuideRowPayload {
    pub size: String,
    #[serde(flatten)]
    pub measurements: BTreeMap<String, String>,
}

/// The final persistable product snapshot assembled at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub category: String,
    pub collection: String,
    pub stock: u32,
    /// Deduplicated, case-normalized.
    pub colors: Vec<String>,
    pub variants: Vec<VariantPayload>,
    /// Derived from the variants; sent for convenience/caching.
    pub sizes: Vec<String>,
    pub size_guide: Vec<SizeGuideRowPayload>,
    /// Opaque pass-through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl CommitSnapshot {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: *product.id(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            price: product.price(),
            category: product.category().to_string(),
            collection: product.collection().to_string(),
            stock: product.stock(),
            colors: product.colors().iter().map(|c| c.to_string()).collect(),
            variants: product
                .variants()
                .iter()
                .map(|v| VariantPayload {
                    color: v.color.as_ref().map(|c| c.to_string()),
                    size: v.size.clone(),
                    quantity: v.quantity,
                })
                .collect(),
            sizes: product.sizes(),
            size_guide: product
                .size_guide()
                .rows()
                .iter()
                .map(|row| SizeGuideRowPayload {
                    size: row.size().to_string(),
                    measurements: row.values().clone(),
                })
                .collect(),
            discount: product.discount().cloned(),
            voucher: product.voucher().cloned(),
            created_at: product.created_at(),
        }
    }
}

/// A file staged this session: handle plus color tag, never bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMediaFile {
    pub handle: String,
    pub kind: MediaKind,
    pub color: Option<String>,
}

/// Media reconciliation payload (separate multipart channel).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaReconcilePayload {
    pub new_files: Vec<NewMediaFile>,
    /// Keyed by stable asset identity, never URL.
    pub existing_color_overrides: HashMap<AssetId, Option<String>>,
    pub replace_all: bool,
}

/// The backend store: accepts the final snapshot and re-validates it
/// authoritatively against the latest durable state.
///
/// The in-session checks cannot see other sessions' uncommitted work, so a
/// commit that passed locally may still be rejected here, surfaced as
/// [`maison_core::ConflictError::StaleCommit`], never silently coerced.
pub trait PersistenceGateway {
    /// Persist the snapshot; returns the new durable revision.
    fn persist(
        &self,
        snapshot: &CommitSnapshot,
        media: &MediaReconcilePayload,
        expected: ExpectedVersion,
    ) -> DomainResult<u64>;
}

/// What the in-memory store holds per product.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub snapshot: CommitSnapshot,
    pub media: MediaReconcilePayload,
    pub version: u64,
}

/// In-memory gateway for tests/dev.
///
/// - No IO / no async
/// - Re-runs the stock-pool and uniqueness invariants on every persist
/// - Enforces [`ExpectedVersion`] against the stored revision
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    entries: Mutex<HashMap<ProductId, StoredEntry>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ProductId) -> Option<StoredEntry> {
        self.entries.lock().ok()?.get(&id).cloned()
    }

    /// Pre-load durable state, e.g. to simulate another session's commit.
    pub fn seed(&self, snapshot: CommitSnapshot, version: u64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                snapshot.product_id,
                StoredEntry {
                    snapshot,
                    media: MediaReconcilePayload::default(),
                    version,
                },
            );
        }
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn persist(
        &self,
        snapshot: &CommitSnapshot,
        media: &MediaReconcilePayload,
        expected: ExpectedVersion,
    ) -> DomainResult<u64> {
        revalidate(snapshot)?;

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DomainError::stale_commit("store unavailable: poisoned lock"))?;
        let current = entries
            .get(&snapshot.product_id)
            .map(|e| e.version)
            .unwrap_or(0);
        expected.check(current)?;

        let next = current + 1;
        entries.insert(
            snapshot.product_id,
            StoredEntry {
                snapshot: snapshot.clone(),
                media: media.clone(),
                version: next,
            },
        );
        Ok(next)
    }
}

/// The authoritative invariant pass a real store would run against its
/// durable state.
fn revalidate(snapshot: &CommitSnapshot) -> DomainResult<()> {
    let total: u64 = snapshot
        .variants
        .iter()
        .map(|v| u64::from(v.quantity))
        .sum();
    if total > u64::from(snapshot.stock) {
        return Err(DomainError::stale_commit(format!(
            "variants allocate {total} against a stock of {}",
            snapshot.stock
        )));
    }
    let mut keys: Vec<(Option<String>, String)> = Vec::new();
    for v in &snapshot.variants {
        if v.quantity == 0 {
            return Err(DomainError::stale_commit(format!(
                "variant {:?}/{} has zero quantity",
                v.color, v.size
            )));
        }
        let key = (
            v.color.as_ref().map(|c| c.to_lowercase()),
            v.size.trim().to_lowercase(),
        );
        if keys.contains(&key) {
            return Err(DomainError::stale_commit(format!(
                "duplicate variant {:?}/{}",
                v.color, v.size
            )));
        }
        keys.push(key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: ProductId, stock: u32, variants: Vec<VariantPayload>) -> CommitSnapshot {
        CommitSnapshot {
            product_id: id,
            name: "Coat".into(),
            description: String::new(),
            price: 12900,
            category: "Outerwear".into(),
            collection: String::new(),
            stock,
            colors: Vec::new(),
            variants,
            sizes: Vec::new(),
            size_guide: Vec::new(),
            discount: None,
            voucher: None,
            created_at: Utc::now(),
        }
    }

    fn variant(size: &str, quantity: u32) -> VariantPayload {
        VariantPayload {
            color: None,
            size: size.into(),
            quantity,
        }
    }

    #[test]
    fn persist_bumps_the_revision() {
        let gateway = InMemoryGateway::new();
        let id = ProductId::new();
        let snap = snapshot(id, 10, vec![variant("S", 3)]);

        let rev = gateway
            .persist(&snap, &MediaReconcilePayload::default(), ExpectedVersion::Any)
            .unwrap();
        assert_eq!(rev, 1);

        let rev = gateway
            .persist(&snap, &MediaReconcilePayload::default(), ExpectedVersion::Exact(1))
            .unwrap();
        assert_eq!(rev, 2);
        assert_eq!(gateway.get(id).unwrap().version, 2);
    }

    #[test]
    fn version_mismatch_is_a_stale_commit() {
        let gateway = InMemoryGateway::new();
        let id = ProductId::new();
        let snap = snapshot(id, 10, Vec::new());
        gateway.seed(snap.clone(), 3);

        let err = gateway
            .persist(&snap, &MediaReconcilePayload::default(), ExpectedVersion::Exact(2))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        // Durable state untouched by the rejected commit.
        assert_eq!(gateway.get(id).unwrap().version, 3);
    }

    #[test]
    fn over_allocation_is_rejected_authoritatively() {
        let gateway = InMemoryGateway::new();
        let snap = snapshot(ProductId::new(), 5, vec![variant("S", 4), variant("M", 3)]);
        let err = gateway
            .persist(&snap, &MediaReconcilePayload::default(), ExpectedVersion::Any)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn duplicate_keys_are_rejected_authoritatively() {
        let gateway = InMemoryGateway::new();
        let snap = snapshot(ProductId::new(), 10, vec![variant("S", 1), variant(" s ", 2)]);
        let err = gateway
            .persist(&snap, &MediaReconcilePayload::default(), ExpectedVersion::Any)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn snapshot_serializes_with_flattened_guide_rows() {
        let mut measurements = BTreeMap::new();
        measurements.insert("Chest".to_string(), "86".to_string());
        let mut snap = snapshot(ProductId::new(), 0, Vec::new());
        snap.size_guide.push(SizeGuideRowPayload {
            size: "S".into(),
            measurements,
        });

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["size_guide"][0]["size"], "S");
        assert_eq!(json["size_guide"][0]["Chest"], "86");
        // Opaque structures are omitted entirely when unset.
        assert!(json.get("discount").is_none());
    }
}
