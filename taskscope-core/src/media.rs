//! Image indexer — classifies screenshot assets by kind and index
//!
//! An asset name such as `step1_before_image_3.png` classifies as
//! `(Before, 3)`: the kind is the first `before`/`after` token of the
//! lowercased name, the index is the last run of digits. Assets that do not
//! classify are left out of the index.

use bytes::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".gif"];

fn kind_re() -> &'static Regex {
    static KIND_RE: OnceLock<Regex> = OnceLock::new();
    KIND_RE.get_or_init(|| Regex::new(r"before|after").expect("valid kind regex"))
}

fn digits_re() -> &'static Regex {
    static DIGITS_RE: OnceLock<Regex> = OnceLock::new();
    DIGITS_RE.get_or_init(|| Regex::new(r"[0-9]+").expect("valid digits regex"))
}

/// Whether a screenshot was taken before or after the step's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Before,
    After,
}

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Before, Kind::After];

    /// Parse a kind token, ignoring case.
    pub fn parse(token: &str) -> Option<Kind> {
        if token.eq_ignore_ascii_case("before") {
            Some(Kind::Before)
        } else if token.eq_ignore_ascii_case("after") {
            Some(Kind::After)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Before => "before",
            Kind::After => "after",
        }
    }
}

/// A named binary entry extracted from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub data: Bytes,
}

impl Asset {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Name without any directory prefix inside the archive.
    pub fn display_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn is_image(&self) -> bool {
        is_image_name(&self.name)
    }

    pub fn classify(&self) -> Option<(Kind, u64)> {
        classify(&self.name)
    }
}

/// `true` for `.png`, `.jpg`, `.jpeg` and `.gif` names, any case.
pub fn is_image_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Classify an asset name into `(kind, index)`.
///
/// Returns `None` when the name has no `before`/`after` token, no digits, or
/// a digit run too large for `u64`.
pub fn classify(name: &str) -> Option<(Kind, u64)> {
    let lower = name.to_lowercase();
    let kind = kind_re()
        .find(&lower)
        .and_then(|m| Kind::parse(m.as_str()))?;
    let digits = digits_re().find_iter(&lower).last()?;
    let index = digits.as_str().parse::<u64>().ok()?;
    Some((kind, index))
}

/// Lookup table from `(kind, index)` to the first asset that classified there.
#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    slots: BTreeMap<(Kind, u64), Asset>,
}

impl ImageIndex {
    /// Build the index from assets in archive order. The first asset to claim
    /// a slot keeps it; later claimants and unclassifiable assets are skipped.
    pub fn build<'a, I>(assets: I) -> Self
    where
        I: IntoIterator<Item = &'a Asset>,
    {
        let mut slots: BTreeMap<(Kind, u64), Asset> = BTreeMap::new();

        for asset in assets {
            let Some(key) = asset.classify() else {
                tracing::debug!(name = %asset.name, "Skipping unclassifiable image");
                continue;
            };

            match slots.get(&key) {
                Some(existing) => {
                    tracing::debug!(
                        name = %asset.name,
                        kept = %existing.name,
                        kind = key.0.as_str(),
                        index = key.1,
                        "Duplicate image slot, keeping first"
                    );
                }
                None => {
                    slots.insert(key, asset.clone());
                }
            }
        }

        Self { slots }
    }

    pub fn get(&self, kind: Kind, index: u64) -> Option<&Asset> {
        self.slots.get(&(kind, index))
    }

    /// Assets of one kind whose index falls in `range`, in ascending index order.
    pub fn range(&self, kind: Kind, range: RangeInclusive<u64>) -> impl Iterator<Item = &Asset> {
        let (start, end) = range.into_inner();
        let bounds = if start <= end {
            Some(((kind, start), (kind, end)))
        } else {
            None
        };
        bounds
            .into_iter()
            .flat_map(move |(lo, hi)| self.slots.range(lo..=hi).map(|(_, asset)| asset))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
