//! Sellable variants and the shared stock pool.
//!
//! Every variant of a product draws its quantity from one declared stock
//! count. The rules here keep two invariants across arbitrary edit
//! sequences: the allocations never sum past the pool, and no two variants
//! share an identity key.

use serde::{Deserialize, Serialize};

use maison_core::{Color, DomainError, DomainResult, ValidationError, ValueObject};

/// A sellable (color, size) combination with its own quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub color: Option<Color>,
    pub size: String,
    pub quantity: u32,
}

impl Variant {
    pub fn new(color: Option<Color>, size: impl Into<String>, quantity: u32) -> Self {
        Self {
            color,
            size: size.into(),
            quantity,
        }
    }

    /// Identity key: normalized color-or-none plus case-folded size.
    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.color.clone(), &self.size)
    }
}

/// Identity of a variant within one product.
///
/// Colors are already case-normalized by construction; sizes are folded here
/// so "S" and "s" name the same variant. The display spelling of a size
/// lives on the [`Variant`], never on its key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    color: Option<Color>,
    size: String,
}

impl VariantKey {
    pub fn new(color: Option<Color>, size: &str) -> Self {
        Self {
            color,
            size: size.trim().to_lowercase(),
        }
    }

    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }

    pub fn size(&self) -> &str {
        &self.size
    }
}

impl ValueObject for VariantKey {}

impl core::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.color {
            Some(color) => write!(f, "{color} / {}", self.size),
            None => write!(f, "(no color) / {}", self.size),
        }
    }
}

/// Decide whether a candidate allocation is legal against the stock pool.
///
/// `excluding` names an entry that is about to be replaced by the candidate,
/// so an in-place quantity edit is judged without double-counting it.
/// Pure; the caller decides what to do with the verdict.
pub fn check_stock_pool(
    existing: &[Variant],
    candidate: &Variant,
    stock: u32,
    excluding: Option<&VariantKey>,
) -> Result<(), ValidationError> {
    let current: u64 = existing
        .iter()
        .filter(|v| excluding.is_none_or(|k| v.key() != *k))
        .map(|v| u64::from(v.quantity))
        .sum();
    let attempted = current + u64::from(candidate.quantity);
    if attempted > u64::from(stock) {
        return Err(ValidationError::ExceedsStock {
            attempted,
            allowed: u64::from(stock),
            current,
        });
    }
    Ok(())
}

/// The variant collection of one product, kept consistent by construction.
///
/// Order is first-seen and survives edits; the derived size list follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    variants: Vec<Variant>,
}

impl VariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a possibly-inconsistent persisted list, folding any
    /// duplicate keys by summing quantities (repair pass for hydration).
    pub fn from_persisted(variants: Vec<Variant>) -> Self {
        Self {
            variants: Self::consolidated(variants),
        }
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn get(&self, key: &VariantKey) -> Option<&Variant> {
        self.variants.iter().find(|v| v.key() == *key)
    }

    /// Total quantity currently drawn from the stock pool.
    pub fn total_allocated(&self) -> u64 {
        self.variants.iter().map(|v| u64::from(v.quantity)).sum()
    }

    /// Derived size list: distinct (case-insensitive) sizes in first-seen
    /// order, first spelling wins. Recomputed from the variants on demand,
    /// never hand-maintained.
    pub fn sizes(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for v in &self.variants {
            let folded = v.size.trim().to_lowercase();
            if !seen.contains(&folded) {
                seen.push(folded);
                out.push(v.size.clone());
            }
        }
        out
    }

    /// Add or update a variant, enforcing identity uniqueness and stock-pool
    /// legality.
    ///
    /// `editing` is the identity key of the entry an operator is editing in
    /// place. When the edit lands on a different key (color and/or size
    /// changed) the old entry is dropped and, if the target key is already
    /// occupied, quantities are **summed** into the survivor; two edits
    /// colliding on one key must never silently destroy stock. A plain add
    /// over an occupied key **replaces** the quantity with the literal value
    /// typed; an exact match is rejected as [`ValidationError::DuplicateNoOp`].
    pub fn upsert(
        &mut self,
        color: Option<Color>,
        size: &str,
        quantity: u32,
        stock: u32,
        editing: Option<&VariantKey>,
    ) -> DomainResult<()> {
        let size = size.trim();
        if size.is_empty() {
            return Err(DomainError::empty("size"));
        }
        if quantity == 0 {
            return Err(DomainError::empty("quantity"));
        }

        let candidate = Variant::new(color, size, quantity);
        let new_key = candidate.key();

        // The pool check must not count an entry the operation replaces:
        // the key under edit, or the occupied target of a plain add.
        let excluded = match editing {
            Some(old) => Some(old),
            None if self.get(&new_key).is_some() => Some(&new_key),
            None => None,
        };
        check_stock_pool(&self.variants, &candidate, stock, excluded)?;

        match editing {
            Some(old) if *old != new_key => {
                let old_pos = self
                    .variants
                    .iter()
                    .position(|v| v.key() == *old)
                    .ok_or(DomainError::NotFound)?;
                self.variants.remove(old_pos);
                if let Some(target) = self.variants.iter_mut().find(|v| v.key() == new_key) {
                    // Merge-on-rename: the survivor absorbs the typed quantity.
                    target.quantity = target.quantity.saturating_add(candidate.quantity);
                } else {
                    // Renamed onto a free key: keep the entry's position.
                    self.variants.insert(old_pos, candidate);
                }
            }
            Some(old) => {
                let entry = self
                    .variants
                    .iter_mut()
                    .find(|v| v.key() == *old)
                    .ok_or(DomainError::NotFound)?;
                entry.size = candidate.size;
                entry.quantity = candidate.quantity;
            }
            None => {
                if let Some(entry) = self.variants.iter_mut().find(|v| v.key() == new_key) {
                    if entry.quantity == candidate.quantity && entry.color == candidate.color {
                        return Err(ValidationError::DuplicateNoOp.into());
                    }
                    entry.quantity = candidate.quantity;
                } else {
                    self.variants.push(candidate);
                }
            }
        }
        Ok(())
    }

    /// Strict insert onto a free key. A collision here means a caller took a
    /// path that should have merged or replaced instead.
    pub fn insert(&mut self, variant: Variant) -> DomainResult<()> {
        let key = variant.key();
        if self.get(&key).is_some() {
            return Err(ValidationError::DuplicateVariantKey(key.to_string()).into());
        }
        self.variants.push(variant);
        Ok(())
    }

    /// Remove the entry at `key`, if any.
    pub fn remove(&mut self, key: &VariantKey) -> Option<Variant> {
        let pos = self.variants.iter().position(|v| v.key() == *key)?;
        Some(self.variants.remove(pos))
    }

    /// Idempotent fold: group by identity key, sum quantities per group,
    /// preserve first-seen key order.
    pub fn consolidate(&mut self) {
        self.variants = Self::consolidated(std::mem::take(&mut self.variants));
    }

    pub fn consolidated(variants: Vec<Variant>) -> Vec<Variant> {
        let mut out: Vec<Variant> = Vec::with_capacity(variants.len());
        for v in variants {
            match out.iter_mut().find(|existing| existing.key() == v.key()) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(v.quantity);
                }
                None => out.push(v),
            }
        }
        out
    }
}
