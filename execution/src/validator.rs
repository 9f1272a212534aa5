//! Opaque pixel counting.

use pixelspace_types::{
    pixels::{count_set_slots, decode_transparency_word},
    ArtworkChannels, ArtworkError, PixelLayout,
};
use std::collections::BTreeSet;

/// Count the opaque pixels an artwork will paint.
///
/// Every set slot of `individual_pixels` and `color_index` is one pixel. Every group
/// contributes `G` pixels, less its transparent slots when alpha is enabled and the group's
/// index is listed in `hint`. Groups outside the hint are treated as fully opaque even if
/// they carry transparency flags.
pub fn count_opaque_pixels(
    layout: &PixelLayout,
    channels: &ArtworkChannels,
    alpha_enabled: bool,
    hint: &[u32],
) -> Result<u64, ArtworkError> {
    let groups = channels.pixel_groups.len();
    if groups != channels.pixel_group_indexes.len() {
        return Err(ArtworkError::malformed(format!(
            "{groups} pixel groups but {} group indexes",
            channels.pixel_group_indexes.len()
        )));
    }
    let transparent = channels.transparent_pixel_groups.len();
    if transparent != channels.transparent_pixel_group_indexes.len() {
        return Err(ArtworkError::malformed(format!(
            "{transparent} transparency words but {} transparency indexes",
            channels.transparent_pixel_group_indexes.len()
        )));
    }

    // Without alpha every group is opaque and the hint is never read.
    let hinted: BTreeSet<usize> = if alpha_enabled {
        hint.iter().map(|i| *i as usize).collect()
    } else {
        BTreeSet::new()
    };
    if let Some(index) = hinted.iter().find(|i| **i >= groups) {
        return Err(ArtworkError::malformed(format!(
            "hint references group {index} but only {groups} groups exist"
        )));
    }

    let mut total = 0u64;
    for word in channels
        .individual_pixels
        .iter()
        .chain(channels.color_index.iter())
    {
        total += u64::from(count_set_slots(layout, word));
    }

    let group_size = u64::from(layout.group_size);
    for index in 0..groups {
        if !hinted.contains(&index) {
            total += group_size;
            continue;
        }
        let word = channels
            .transparent_pixel_groups
            .get(index)
            .ok_or_else(|| {
                ArtworkError::malformed(format!("hinted group {index} has no transparency word"))
            })?;
        let mask = decode_transparency_word(layout, word);
        total += group_size - u64::from(mask.count());
    }

    Ok(total)
}
