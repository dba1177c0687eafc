// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use drm_sys::{hdr_output_metadata, HDMI_EOTF_SMPTE_ST2084, HDMI_STATIC_METADATA_TYPE1};
use std::mem::size_of;
use std::slice;

/// Static HDR metadata for the active stream, as supplied by the streaming
/// session. All values use the CTA-861.3 encoding the display expects.
///
/// Absence of metadata is a valid state; `Default` yields the all-zero
/// infoframe the display path signals in that case.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HdrStaticMetadata {
    /// Chromaticity coordinates of the mastering display primaries (x, y)
    pub display_primaries: [(u16, u16); 3],
    /// Chromaticity coordinates of the white point (x, y)
    pub white_point: (u16, u16),
    pub max_display_mastering_luminance: u16,
    pub min_display_mastering_luminance: u16,
    pub max_content_light_level: u16,
    pub max_frame_average_light_level: u16,
}

/// Build the kernel `hdr_output_metadata` payload for the connector
/// property: static metadata type 1 with the SMPTE ST 2084 transfer
/// function, populated from `source` or zero-filled when none exists.
pub fn output_metadata(source: Option<&HdrStaticMetadata>) -> hdr_output_metadata {
    let source = source.copied().unwrap_or_default();

    let mut metadata = hdr_output_metadata {
        metadata_type: HDMI_STATIC_METADATA_TYPE1,
        ..Default::default()
    };
    metadata.hdmi_metadata_type1.eotf = HDMI_EOTF_SMPTE_ST2084;
    metadata.hdmi_metadata_type1.metadata_type = HDMI_STATIC_METADATA_TYPE1 as u8;
    for (out, (x, y)) in metadata
        .hdmi_metadata_type1
        .display_primaries
        .iter_mut()
        .zip(source.display_primaries)
    {
        out.x = x;
        out.y = y;
    }
    metadata.hdmi_metadata_type1.white_point.x = source.white_point.0;
    metadata.hdmi_metadata_type1.white_point.y = source.white_point.1;
    metadata.hdmi_metadata_type1.max_display_mastering_luminance =
        source.max_display_mastering_luminance;
    metadata.hdmi_metadata_type1.min_display_mastering_luminance =
        source.min_display_mastering_luminance;
    metadata.hdmi_metadata_type1.max_cll = source.max_content_light_level;
    metadata.hdmi_metadata_type1.max_fall = source.max_frame_average_light_level;
    metadata
}

/// Raw bytes of the metadata payload, for property blob creation.
pub fn metadata_bytes(metadata: &hdr_output_metadata) -> &[u8] {
    unsafe {
        slice::from_raw_parts(
            (metadata as *const hdr_output_metadata).cast::<u8>(),
            size_of::<hdr_output_metadata>(),
        )
    }
}
