//! Artifact naming convention.
//!
//! Output names are a pure function of brand, scenario, source image and
//! artifact index, so repeated runs on the same source overwrite rather
//! than accumulate, and siblings from one job never collide.

/// Generate the local filename for one artifact.
///
/// Convention: `{brand}_{scenario}_{source_stem}_v{index}.{ext}`
///
/// - `brand` = lowercase brand prefix, omitted (with its underscore) when empty
/// - `index` = position of the artifact in the job's result list
///
/// # Examples
///
/// ```
/// use showreel_core::naming::artifact_filename;
///
/// assert_eq!(
///     artifact_filename("turan", "evening_ambiance", "lux_white", 0, "mp4"),
///     "turan_evening_ambiance_lux_white_v0.mp4"
/// );
/// assert_eq!(artifact_filename("", "custom", "img", 2, "mp4"), "custom_img_v2.mp4");
/// ```
pub fn artifact_filename(
    brand_prefix: &str,
    scenario_id: &str,
    source_stem: &str,
    index: usize,
    ext: &str,
) -> String {
    let mut name = String::new();

    let brand = brand_prefix.trim().to_lowercase();
    if !brand.is_empty() {
        name.push_str(&brand);
        name.push('_');
    }

    name.push_str(scenario_id);
    name.push('_');
    name.push_str(&sanitize(source_stem));

    name.push_str("_v");
    name.push_str(&index.to_string());

    name.push('.');
    name.push_str(ext);
    name
}

/// Replace path separators and spaces so the stem stays a single segment.
fn sanitize(stem: &str) -> String {
    stem.chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            other => other,
        })
        .collect()
}
