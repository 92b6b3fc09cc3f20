//! `forgebox targets` - list configured platform variants

use anyhow::Result;
use std::path::Path;

use super::build::load_variant_set;

/// Prints the variant table, one line per target.
pub fn list_targets(variants: Option<&Path>) -> Result<()> {
    let set = load_variant_set(variants)?;

    for variant in &set.variants {
        let patches = variant.prebuild_commands.len();
        let patch_label = if patches == 1 { "patch" } else { "patches" };
        println!(
            "{:<14} {}  ({} {}, {} artifact(s))",
            variant.name,
            variant.image,
            patches,
            patch_label,
            variant.artifacts.len()
        );
    }

    Ok(())
}
