//! Aggregate root: the catalog product under edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use maison_core::{AggregateRoot, Color, DomainError, DomainResult, ProductId, ValidationError};
use maison_media::MediaAsset;
use maison_sizeguide::SizeGuide;

use crate::variant::{Variant, VariantKey, VariantSet};

/// Everything the store knows about a product, for rehydration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductParts {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub category: String,
    pub collection: String,
    pub stock: u32,
    pub colors: Vec<Color>,
    pub variants: Vec<Variant>,
    pub media: Vec<MediaAsset>,
    pub size_guide: SizeGuide,
    pub discount: Option<Value>,
    pub voucher: Option<Value>,
    pub created_at: DateTime<Utc>,
    /// Durable revision this snapshot was read at.
    pub version: u64,
}

/// Aggregate root: Product.
///
/// Holds the shared stock pool and every collection that draws on it or
/// tags against it. All mutation goes through methods that keep the pool
/// invariant intact; the size list is always derived from the variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: u64,
    category: String,
    collection: String,
    stock: u32,
    colors: Vec<Color>,
    variants: VariantSet,
    media: Vec<MediaAsset>,
    size_guide: SizeGuide,
    discount: Option<Value>,
    voucher: Option<Value>,
    created_at: DateTime<Utc>,
    version: u64,
}

impl Product {
    /// Create an empty draft product.
    pub fn new(id: ProductId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            price: 0,
            category: String::new(),
            collection: String::new(),
            stock: 0,
            colors: Vec::new(),
            variants: VariantSet::new(),
            media: Vec::new(),
            size_guide: SizeGuide::new(),
            discount: None,
            voucher: None,
            created_at,
            version: 0,
        }
    }

    /// Rehydrate from a persisted snapshot, repairing upstream
    /// inconsistencies defensively: duplicate variant keys are folded and
    /// the palette deduplicated.
    pub fn hydrate(parts: ProductParts) -> Self {
        let mut colors: Vec<Color> = Vec::new();
        for color in parts.colors {
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
        Self {
            id: parts.id,
            name: parts.name,
            description: parts.description,
            price: parts.price,
            category: parts.category,
            collection: parts.collection,
            stock: parts.stock,
            colors,
            variants: VariantSet::from_persisted(parts.variants),
            media: parts.media,
            size_guide: parts.size_guide,
            discount: parts.discount,
            voucher: parts.voucher,
            created_at: parts.created_at,
            version: parts.version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn variants(&self) -> &[Variant] {
        self.variants.as_slice()
    }

    pub fn media(&self) -> &[MediaAsset] {
        &self.media
    }

    pub fn size_guide(&self) -> &SizeGuide {
        &self.size_guide
    }

    pub fn discount(&self) -> Option<&Value> {
        self.discount.as_ref()
    }

    pub fn voucher(&self) -> Option<&Value> {
        self.voucher.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Derived size list (first-seen order).
    pub fn sizes(&self) -> Vec<String> {
        self.variants.sizes()
    }

    pub fn total_allocated(&self) -> u64 {
        self.variants.total_allocated()
    }

    pub fn set_name(&mut self, name: &str) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::empty("name"));
        }
        self.name = name.trim().to_string();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_price(&mut self, price: u64) {
        self.price = price;
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    pub fn set_collection(&mut self, collection: impl Into<String>) {
        self.collection = collection.into();
    }

    /// Change the declared stock pool. Shrinking below what the variants
    /// already draw would break the pool invariant and is rejected.
    pub fn set_stock(&mut self, stock: u32) -> DomainResult<()> {
        let allocated = self.variants.total_allocated();
        if allocated > u64::from(stock) {
            return Err(ValidationError::ExceedsStock {
                attempted: allocated,
                allowed: u64::from(stock),
                current: allocated,
            }
            .into());
        }
        self.stock = stock;
        Ok(())
    }

    /// Add a color to the palette. Idempotent: re-adding an existing color
    /// (any case) succeeds and reports `false`.
    pub fn add_color(&mut self, color: Color) -> bool {
        if self.colors.contains(&color) {
            return false;
        }
        self.colors.push(color);
        true
    }

    /// Remove a palette color. Variants and media tagged with it keep their
    /// references (orphan-and-ignore).
    pub fn remove_color(&mut self, color: &Color) -> bool {
        let before = self.colors.len();
        self.colors.retain(|c| c != color);
        self.colors.len() != before
    }

    /// Stage a variant add or edit against the stock pool.
    pub fn upsert_variant(
        &mut self,
        color: Option<Color>,
        size: &str,
        quantity: u32,
        editing: Option<&VariantKey>,
    ) -> DomainResult<()> {
        self.variants.upsert(color, size, quantity, self.stock, editing)
    }

    pub fn remove_variant(&mut self, key: &VariantKey) -> Option<Variant> {
        self.variants.remove(key)
    }

    /// Defensive final pass before commit.
    pub fn consolidate_variants(&mut self) {
        self.variants.consolidate();
    }

    /// Append a staged media asset at the end of the display order.
    pub fn add_media(&mut self, asset: MediaAsset) {
        self.media.push(asset);
    }

    pub fn remove_media(&mut self, id: maison_core::AssetId) -> DomainResult<MediaAsset> {
        use maison_core::Entity;
        let pos = self
            .media
            .iter()
            .position(|a| *a.id() == id)
            .ok_or(DomainError::NotFound)?;
        Ok(self.media.remove(pos))
    }

    /// Replace the media list wholesale (the commit reconciliation result).
    pub fn set_media(&mut self, media: Vec<MediaAsset>) {
        self.media = media;
    }

    pub fn assign_media_color(
        &mut self,
        id: maison_core::AssetId,
        color: Option<Color>,
    ) -> DomainResult<()> {
        maison_media::assign_color(&mut self.media, id, color)
    }

    pub fn add_measurement_field(&mut self, name: &str) -> DomainResult<()> {
        self.size_guide.add_field(name)
    }

    pub fn remove_measurement_field(&mut self, name: &str) -> bool {
        self.size_guide.remove_field(name)
    }

    pub fn upsert_size_guide_row(
        &mut self,
        size: &str,
        values: std::collections::BTreeMap<String, String>,
        editing: Option<usize>,
    ) -> DomainResult<()> {
        self.size_guide.upsert_row(size, values, editing)
    }

    pub fn remove_size_guide_row(&mut self, index: usize) -> DomainResult<()> {
        self.size_guide.remove_row(index).map(|_| ())
    }

    /// Opaque pass-through; the engine never interprets these.
    pub fn set_discount(&mut self, discount: Option<Value>) {
        self.discount = discount;
    }

    pub fn set_voucher(&mut self, voucher: Option<Value>) {
        self.voucher = voucher;
    }

    /// Record the durable revision returned by the store after a commit.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
