//! Step-image resolver — maps `code_output` text to indexed screenshots
//!
//! Three reference forms are recognised, case-insensitively:
//! - range: `1_before_image to 3_before_image`
//! - single: `2after_image`, `4-before-image`
//! - indexed pair: `image_5` (both kinds)
//!
//! Ranges are consumed first and stripped from a working copy of the text so
//! their endpoints are not counted again as singles. The single and pair
//! passes both scan the stripped copy.

use crate::media::{Asset, ImageIndex, Kind};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn range_re() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(
            r"(?i)([0-9]+)[_.-]?(before|after)[_.-]?image to ([0-9]+)[_.-]?(before|after)[_.-]?image",
        )
        .expect("valid range regex")
    })
}

fn single_re() -> &'static Regex {
    static SINGLE_RE: OnceLock<Regex> = OnceLock::new();
    SINGLE_RE.get_or_init(|| {
        Regex::new(r"(?i)([0-9]+)[_.-]?(before|after)[_.-]?image").expect("valid single regex")
    })
}

fn pair_re() -> &'static Regex {
    static PAIR_RE: OnceLock<Regex> = OnceLock::new();
    PAIR_RE.get_or_init(|| Regex::new(r"(?i)image_([0-9]+)").expect("valid pair regex"))
}

/// Screenshots resolved for one step, per kind, sorted by asset name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepImageSet {
    pub before: Vec<Asset>,
    pub after: Vec<Asset>,
}

impl StepImageSet {
    pub fn get(&self, kind: Kind) -> &[Asset] {
        match kind {
            Kind::Before => &self.before,
            Kind::After => &self.after,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    /// Append unless an asset with the same name is already listed for `kind`.
    fn push_unique(&mut self, kind: Kind, asset: &Asset) {
        let list = match kind {
            Kind::Before => &mut self.before,
            Kind::After => &mut self.after,
        };
        if !list.iter().any(|a| a.name == asset.name) {
            list.push(asset.clone());
        }
    }

    fn sort_by_name(&mut self) {
        self.before.sort_by(|a, b| a.name.cmp(&b.name));
        self.after.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Resolve the images referenced by a step's `code_output`.
///
/// Returns `None` when `code_output` is absent, not a string, or references
/// nothing present in `index`.
pub fn resolve_step_images(code_output: Option<&Value>, index: &ImageIndex) -> Option<StepImageSet> {
    let text = code_output.and_then(Value::as_str)?;
    let set = resolve_text(text, index);
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

/// Run the three passes over `text`. The result may be empty.
pub fn resolve_text(text: &str, index: &ImageIndex) -> StepImageSet {
    let mut set = StepImageSet::default();

    let residual = collect_ranges(text, index, &mut set);
    collect_singles(&residual, index, &mut set);
    collect_pairs(&residual, index, &mut set);

    set.sort_by_name();
    set
}

/// Range pass. Returns `text` with every matched range removed.
fn collect_ranges(text: &str, index: &ImageIndex, set: &mut StepImageSet) -> String {
    let mut residual = text.to_string();

    for caps in range_re().captures_iter(text) {
        let start = caps[1].parse::<u64>().ok();
        let first = Kind::parse(&caps[2]);
        let end = caps[3].parse::<u64>().ok();
        let second = Kind::parse(&caps[4]);

        if let (Some(start), Some(first), Some(end), Some(second)) = (start, first, end, second) {
            if first == second {
                for asset in index.range(first, start..=end) {
                    set.push_unique(first, asset);
                }
            } else {
                tracing::debug!(range = &caps[0], "Ignoring range with mixed kinds");
            }
        }

        residual = residual.replacen(&caps[0], "", 1);
    }

    residual
}

fn collect_singles(text: &str, index: &ImageIndex, set: &mut StepImageSet) {
    for caps in single_re().captures_iter(text) {
        let (Ok(n), Some(kind)) = (caps[1].parse::<u64>(), Kind::parse(&caps[2])) else {
            continue;
        };
        if let Some(asset) = index.get(kind, n) {
            set.push_unique(kind, asset);
        }
    }
}

fn collect_pairs(text: &str, index: &ImageIndex, set: &mut StepImageSet) {
    for caps in pair_re().captures_iter(text) {
        let Ok(n) = caps[1].parse::<u64>() else {
            continue;
        };
        for kind in Kind::ALL {
            if let Some(asset) = index.get(kind, n) {
                set.push_unique(kind, asset);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index_of(names: &[&str]) -> ImageIndex {
        let assets: Vec<Asset> = names
            .iter()
            .map(|n| Asset::new(*n, n.as_bytes().to_vec()))
            .collect();
        ImageIndex::build(&assets)
    }

    fn names(list: &[Asset]) -> Vec<&str> {
        list.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_range_resolves_inclusive_span() {
        let index = index_of(&["before_1.png", "before_2.png", "before_3.png", "before_4.png"]);
        let set = resolve_text("1_before_image to 3_before_image", &index);

        assert_eq!(names(&set.before), vec!["before_1.png", "before_2.png", "before_3.png"]);
        assert!(set.after.is_empty());
    }

    #[test]
    fn test_range_with_mixed_kinds_resolves_nothing() {
        let index = index_of(&["before_1.png", "after_3.png"]);
        let set = resolve_text("1_before_image to 3_after_image", &index);

        assert!(set.is_empty(), "mixed-kind range is consumed without resolving");
    }

    #[test]
    fn test_range_tolerates_missing_indices() {
        let index = index_of(&["after_2.png", "after_5.png"]);
        let set = resolve_text("see 1.after.image to 6-after-image", &index);

        assert_eq!(names(&set.after), vec!["after_2.png", "after_5.png"]);
    }

    #[test]
    fn test_single_references_are_case_insensitive() {
        let index = index_of(&["before_4.png", "after_7.png"]);
        let set = resolve_text("Compare 4BEFORE_Image with 7-After-IMAGE.", &index);

        assert_eq!(names(&set.before), vec!["before_4.png"]);
        assert_eq!(names(&set.after), vec!["after_7.png"]);
    }

    #[test]
    fn test_duplicate_references_listed_once() {
        let index = index_of(&["before_1.png"]);
        let set = resolve_text("1before image 1_before_image", &index);

        assert_eq!(names(&set.before), vec!["before_1.png"]);
    }

    #[test]
    fn test_duplicates_across_passes_listed_once() {
        let index = index_of(&["before_1.png", "before_2.png", "after_2.png"]);
        let set = resolve_text("1_before_image to 2_before_image, then 2_before_image and image_2", &index);

        assert_eq!(names(&set.before), vec!["before_1.png", "before_2.png"]);
        assert_eq!(names(&set.after), vec!["after_2.png"]);
    }

    #[test]
    fn test_indexed_pair_resolves_both_kinds() {
        let index = index_of(&["before_2.png", "after_2.png", "after_3.png"]);
        let set = resolve_text("see image_2", &index);

        assert_eq!(names(&set.before), vec!["before_2.png"]);
        assert_eq!(names(&set.after), vec!["after_2.png"]);
    }

    #[test]
    fn test_results_sorted_by_name() {
        let index = index_of(&["shot_before_10.png", "shot_before_9.png"]);
        let set = resolve_text("10_before_image and 9_before_image", &index);

        // byte-wise ordering, not numeric
        assert_eq!(names(&set.before), vec!["shot_before_10.png", "shot_before_9.png"]);
    }

    #[test]
    fn test_range_text_is_not_rescanned_as_single() {
        let index = index_of(&["before_1.png", "before_3.png", "after_1.png"]);
        let set = resolve_text("1_before_image to 1_before_image", &index);

        assert_eq!(names(&set.before), vec!["before_1.png"]);
        assert!(set.after.is_empty());
    }

    #[test]
    fn test_non_string_output_resolves_to_none() {
        let index = index_of(&["before_1.png"]);

        assert!(resolve_step_images(None, &index).is_none());
        assert!(resolve_step_images(Some(&json!({"out": "1_before_image"})), &index).is_none());
        assert!(resolve_step_images(Some(&json!(1)), &index).is_none());
    }

    #[test]
    fn test_unresolved_references_yield_none() {
        let index = index_of(&["before_1.png"]);
        assert!(resolve_step_images(Some(&json!("5_after_image")), &index).is_none());

        let set = resolve_step_images(Some(&json!("1_before_image")), &index).unwrap();
        assert_eq!(names(&set.before), vec!["before_1.png"]);
    }
}
