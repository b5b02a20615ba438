use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::foundation::error::CrResult;
use crate::text::family::normalize_family;
use crate::text::font::{FontFace, FontHandle, FontSupplier, FontWeight, TypographyKey};

/// One strategy of the font fallback chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", content = "family", rename_all = "snake_case")]
pub enum FallbackStep {
    /// Same family, weight and italic flag.
    Exact,
    /// Same family and italic flag, closest weight (ties go to the lighter face).
    NearestWeight,
    /// Same family, upright face closest to regular, else the family's first face.
    FamilyRegular,
    /// Best face of another family.
    Family(String),
    /// The face compiled into the crate.
    Bundled,
}

impl FallbackStep {
    /// Default chain: exact, nearest weight, family regular, bundled.
    pub fn default_chain() -> Vec<Self> {
        vec![
            Self::Exact,
            Self::NearestWeight,
            Self::FamilyRegular,
            Self::Bundled,
        ]
    }
}

/// Outcome of a successful resolution.
#[derive(Clone, Debug)]
pub struct FontResolution {
    /// Loaded face.
    pub handle: Arc<FontHandle>,
    /// Strategy that produced the face.
    pub matched: FallbackStep,
}

impl FontResolution {
    /// `true` when the requested face was found without falling back.
    pub fn is_exact(&self) -> bool {
        self.matched == FallbackStep::Exact
    }
}

/// Thread-safe read-through cache of resolved faces.
///
/// A cache is only valid for one font supplier and one fallback chain; share it between
/// renderers built from the same font library.
#[derive(Debug, Default)]
pub struct SharedFontCache {
    entries: RwLock<HashMap<TypographyKey, FontResolution>>,
}

impl SharedFontCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached resolution for a key.
    pub fn get(&self, key: &TypographyKey) -> Option<FontResolution> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store a resolution; an existing entry wins so concurrent callers agree.
    pub fn insert(&self, key: TypographyKey, resolution: FontResolution) -> FontResolution {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(resolution)
            .clone()
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Faces resolved for one render call, with the bundled face as a last resort.
#[derive(Clone, Debug)]
pub struct FontSet {
    faces: HashMap<TypographyKey, Arc<FontHandle>>,
    fallback: Arc<FontHandle>,
}

impl FontSet {
    /// Set holding only the bundled face.
    pub fn new() -> CrResult<Self> {
        Ok(Self {
            faces: HashMap::new(),
            fallback: Arc::new(FontHandle::bundled()?),
        })
    }

    /// Resolve `key` through `resolver` unless it is already present.
    pub fn resolve_into(
        &mut self,
        resolver: &FontResolver<'_>,
        key: &TypographyKey,
    ) -> CrResult<Option<FontResolution>> {
        if self.faces.contains_key(key) {
            return Ok(None);
        }
        let resolution = resolver.resolve(key)?;
        self.faces
            .insert(key.clone(), Arc::clone(&resolution.handle));
        Ok(Some(resolution))
    }

    /// Face for `key`; keys never resolved map to the bundled face.
    pub fn get(&self, key: &TypographyKey) -> &Arc<FontHandle> {
        self.faces.get(key).unwrap_or(&self.fallback)
    }

    /// Number of resolved keys.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// `true` when no key has been resolved.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Maps typography keys to faces through an ordered fallback chain.
#[derive(Clone, Copy, Debug)]
pub struct FontResolver<'a> {
    supplier: Option<&'a dyn FontSupplier>,
    chain: &'a [FallbackStep],
    cache: Option<&'a SharedFontCache>,
}

impl<'a> FontResolver<'a> {
    /// Resolver over an optional supplier; without one only [`FallbackStep::Bundled`] matches.
    pub fn new(supplier: Option<&'a dyn FontSupplier>, chain: &'a [FallbackStep]) -> Self {
        Self {
            supplier,
            chain,
            cache: None,
        }
    }

    /// Read through (and populate) a shared cache.
    pub fn with_cache(mut self, cache: &'a SharedFontCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Resolve a key. Never fails for a missing font; fails with
    /// [`CrError::FontLoad`](crate::CrError::FontLoad) when the selected face is not a valid font.
    pub fn resolve(&self, key: &TypographyKey) -> CrResult<FontResolution> {
        if let Some(hit) = self.cache.and_then(|c| c.get(key)) {
            return Ok(hit);
        }
        let resolution = self.resolve_uncached(key)?;
        if !resolution.is_exact() {
            tracing::warn!(
                family = %key.family,
                weight = ?key.weight,
                italic = key.italic,
                matched = ?resolution.matched,
                resolved = resolution.handle.family(),
                "font fallback"
            );
        }
        Ok(match self.cache {
            Some(cache) => cache.insert(key.clone(), resolution),
            None => resolution,
        })
    }

    fn resolve_uncached(&self, key: &TypographyKey) -> CrResult<FontResolution> {
        let faces = self.faces(&key.family);
        for step in self.chain {
            let picked = match step {
                FallbackStep::Exact => exact(faces, key).map(|f| (key.family.clone(), f)),
                FallbackStep::NearestWeight => {
                    nearest_weight(faces, key.weight, key.italic).map(|f| (key.family.clone(), f))
                }
                FallbackStep::FamilyRegular => {
                    family_regular(faces).map(|f| (key.family.clone(), f))
                }
                FallbackStep::Family(name) => {
                    let name = normalize_family(name);
                    let alt = self.faces(&name);
                    exact(alt, key)
                        .or_else(|| nearest_weight(alt, key.weight, key.italic))
                        .or_else(|| family_regular(alt))
                        .map(|f| (name, f))
                }
                FallbackStep::Bundled => break,
            };
            if let Some((family, face)) = picked {
                return Ok(FontResolution {
                    handle: Arc::new(FontHandle::from_face(&family, face)?),
                    matched: step.clone(),
                });
            }
        }
        Ok(FontResolution {
            handle: Arc::new(FontHandle::bundled()?),
            matched: FallbackStep::Bundled,
        })
    }

    fn faces(&self, family: &str) -> &'a [FontFace] {
        self.supplier
            .and_then(|s| s.family(family))
            .unwrap_or_default()
    }
}

fn exact<'f>(faces: &'f [FontFace], key: &TypographyKey) -> Option<&'f FontFace> {
    faces
        .iter()
        .find(|f| f.weight == key.weight && f.italic == key.italic)
}

fn nearest_weight(faces: &[FontFace], weight: FontWeight, italic: bool) -> Option<&FontFace> {
    faces
        .iter()
        .filter(|f| f.italic == italic)
        .min_by_key(|f| (f.weight.value().abs_diff(weight.value()), f.weight))
}

fn family_regular(faces: &[FontFace]) -> Option<&FontFace> {
    nearest_weight(faces, FontWeight::Regular, false).or_else(|| faces.first())
}

#[cfg(test)]
#[path = "../../tests/unit/text/resolve.rs"]
mod tests;
