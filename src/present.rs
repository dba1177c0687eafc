// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use crate::backend::{FrameBackend, MappedFrame};
use crate::device::{DrmDevice, EnumProperty, ModeSetting, ObjectType, PlaneBinding};
use crate::frame::{Colorspace, FourCC, PrimeDescriptor, Rect, VideoFrame, MAX_PRIME_PLANES, NV12};
use crate::hdr::{self, HdrStaticMetadata};
use std::{env, error::Error};
use tracing::{debug, error, info, warn};

/// Presentation-mode override, normally [`RenderPreference::Auto`].
///
/// Process-wide diagnostics can force one mode through the environment;
/// the value is resolved once and passed in explicitly rather than read
/// ambiently at decision time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RenderPreference {
    #[default]
    Auto,
    ForceDirect,
    ForceGpuImage,
}

impl RenderPreference {
    /// Resolve the override from `DRM_FORCE_DIRECT` / `DRM_FORCE_EGL`.
    pub fn from_env() -> Self {
        if env::var("DRM_FORCE_DIRECT").as_deref() == Ok("1") {
            RenderPreference::ForceDirect
        } else if env::var("DRM_FORCE_EGL").as_deref() == Ok("1") {
            RenderPreference::ForceGpuImage
        } else {
            RenderPreference::Auto
        }
    }
}

/// Whether the pipeline should hand frames to the GPU compositing path
/// instead of committing them directly to the hardware plane.
///
/// Absent an override, the direct path wins only when it is available and
/// the session carries 10-bit HDR content, which the GPU path cannot
/// present faithfully.
pub fn prefer_gpu_image(preference: RenderPreference, direct_supported: bool, hdr10: bool) -> bool {
    match preference {
        RenderPreference::ForceDirect => false,
        RenderPreference::ForceGpuImage => true,
        RenderPreference::Auto => !(direct_supported && hdr10),
    }
}

/// Presentation traits the owning pipeline sizes its windowing around.
#[derive(Copy, Clone, Debug)]
pub struct RendererAttributes {
    /// Plane presentation covers the CRTC, never a window
    pub fullscreen_only: bool,
    /// The path can signal HDR metadata to the display
    pub hdr_support: bool,
    /// No frames are queued in the graphics pipeline
    pub unbuffered: bool,
}

/// Last property values applied to the plane, kept to skip redundant
/// writes.
struct ColorState {
    last_full_range: bool,
    last_colorspace: Option<Colorspace>,
}

/// Device enum name for the plane color-encoding property.
pub fn color_encoding_name(colorspace: Colorspace) -> Option<&'static str> {
    match colorspace {
        Colorspace::Bt601 => Some("ITU-R BT.601 YCbCr"),
        Colorspace::Bt709 => Some("ITU-R BT.709 YCbCr"),
        Colorspace::Bt2020 => Some("ITU-R BT.2020 YCbCr"),
        Colorspace::Unknown => None,
    }
}

/// Device enum name for the plane color-range property.
pub fn color_range_name(full_range: bool) -> &'static str {
    if full_range {
        "YCbCr full range"
    } else {
        "YCbCr limited range"
    }
}

enum FrameSource<'a> {
    Mapped(MappedFrame<'a>),
    Native(&'a PrimeDescriptor),
}

impl FrameSource<'_> {
    fn descriptor(&self) -> &PrimeDescriptor {
        match self {
            FrameSource::Mapped(mapped) => mapped,
            FrameSource::Native(descriptor) => descriptor,
        }
    }
}

/// Presents decoded frames on a hardware overlay plane.
///
/// Owns the kernel resources it derives from frames (buffer handles,
/// framebuffer objects, the HDR metadata blob) and releases every one of
/// them deterministically: rollback on per-frame failure, full teardown on
/// drop. At most one framebuffer is live as "current" outside the brief
/// create-commit-destroy window of a single render call.
///
/// The render entry point must be called serially; the renderer keeps no
/// locks and no threads.
pub struct PlaneRenderer<D: ModeSetting = DrmDevice> {
    device: D,
    binding: PlaneBinding,
    backend: Option<Box<dyn FrameBackend>>,
    hdr10: bool,
    current_fb: u32,
    color: ColorState,
    color_encoding: Option<EnumProperty>,
    color_range: Option<EnumProperty>,
    hdr_metadata: Option<EnumProperty>,
    hdr_blob: u32,
}

impl<D: ModeSetting> PlaneRenderer<D> {
    /// Binds the renderer to a discovered presentation path and snapshots
    /// the optional color and HDR properties.
    ///
    /// Missing properties disable the corresponding negotiation for the
    /// lifetime of the instance; each absence is logged here, once.
    pub fn new(device: D, binding: PlaneBinding, hdr10: bool, backend: Option<Box<dyn FrameBackend>>) -> Self {
        let color_encoding =
            device.find_enum_property(binding.plane_id, ObjectType::Plane, "COLOR_ENCODING");
        let color_range = device.find_enum_property(binding.plane_id, ObjectType::Plane, "COLOR_RANGE");
        let hdr_metadata =
            device.find_enum_property(binding.connector_id, ObjectType::Connector, "HDR_OUTPUT_METADATA");

        for (prop, what) in [
            (&color_encoding, "COLOR_ENCODING"),
            (&color_range, "COLOR_RANGE"),
        ] {
            match prop {
                Some(found) => debug!("plane exposes {what} with {} enum entries", found.enums.len()),
                None => warn!(
                    "{what} property does not exist on plane {}, colors may be inaccurate",
                    binding.plane_id
                ),
            }
        }
        if hdr_metadata.is_none() {
            warn!(
                "HDR_OUTPUT_METADATA property does not exist on connector {}, HDR signaling disabled",
                binding.connector_id
            );
        }

        Self {
            device,
            binding,
            backend,
            hdr10,
            current_fb: 0,
            color: ColorState {
                last_full_range: false,
                last_colorspace: None,
            },
            color_encoding,
            color_range,
            hdr_metadata,
            hdr_blob: 0,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn binding(&self) -> PlaneBinding {
        self.binding
    }

    /// Framebuffer currently committed to the plane, if any.
    pub fn current_framebuffer(&self) -> Option<u32> {
        (self.current_fb != 0).then_some(self.current_fb)
    }

    pub fn attributes(&self) -> RendererAttributes {
        RendererAttributes {
            fullscreen_only: true,
            hdr_support: true,
            unbuffered: true,
        }
    }

    pub fn is_direct_rendering_supported(&self) -> bool {
        true
    }

    /// Pixel format the decoder should produce for this path.
    pub fn preferred_format(&self) -> FourCC {
        match &self.backend {
            Some(backend) => backend.preferred_format(),
            None => NV12,
        }
    }

    /// Only the preferred format is presentable on the plane path.
    pub fn supports_format(&self, format: FourCC) -> bool {
        format == self.preferred_format()
    }

    /// Whether the owning pipeline should present through the GPU image
    /// export path instead of this plane.
    pub fn prefers_gpu_export(&self, preference: RenderPreference) -> bool {
        let gpu = prefer_gpu_image(preference, self.is_direct_rendering_supported(), self.hdr10);
        match preference {
            RenderPreference::ForceDirect => info!("using direct rendering due to environment override"),
            RenderPreference::ForceGpuImage => info!("using GPU image export due to environment override"),
            RenderPreference::Auto if !gpu => info!("using direct rendering for HDR support"),
            RenderPreference::Auto => info!("plane path supports exporting GPU images"),
        }
        gpu
    }

    /// The path cannot be validated from capability flags alone; the
    /// pipeline must push one real decoded frame through before trusting
    /// it for continuous presentation.
    pub fn needs_test_frame(&self) -> bool {
        true
    }

    /// Probe the composing backend's PRIME export with a real frame.
    ///
    /// # Errors
    ///
    /// An error means the backend cannot map frames for this path and the
    /// pipeline must fall back to another renderer.
    pub fn test_frame(&self, frame: &VideoFrame) -> Result<(), Box<dyn Error>> {
        if let Some(backend) = &self.backend {
            debug_assert!(backend.can_export_prime());
            MappedFrame::map(backend.as_ref(), frame)?;
        }
        Ok(())
    }

    /// Presents one decoded frame at `dst` on the hardware plane.
    ///
    /// On any failure the frame is dropped and the previously committed
    /// framebuffer stays on screen untouched.
    ///
    /// # Errors
    ///
    /// Buffer import, framebuffer creation, and plane commit failures are
    /// fatal to this frame only; rendering may continue with the next one.
    pub fn render(&mut self, frame: &VideoFrame, dst: Rect) -> Result<(), Box<dyn Error>> {
        let mut handles = [0u32; 4];
        let mut pitches = [0u32; 4];
        let mut offsets = [0u32; 4];
        let mut modifiers = [0u64; 4];
        let mut have_modifiers = false;

        let created = {
            let source = match &self.backend {
                Some(backend) => FrameSource::Mapped(MappedFrame::map(backend.as_ref(), frame)?),
                None => FrameSource::Native(frame.prime.as_ref().ok_or(
                    "frame is not in device-native form and no composing backend is configured",
                )?),
            };
            let descriptor = source.descriptor();
            let layer = descriptor.composed_layer();
            assert!(
                layer.planes.len() <= MAX_PRIME_PLANES,
                "composed layer has too many planes"
            );

            for (index, plane) in layer.planes.iter().enumerate() {
                let object = descriptor.object(plane);
                handles[index] = self.device.prime_to_handle(object.fd).map_err(|e| {
                    error!("PRIME buffer import failed: {e}");
                    e
                })?;
                pitches[index] = plane.pitch;
                offsets[index] = plane.offset;
                modifiers[index] = object.modifier;
                if object.has_modifier() {
                    have_modifiers = true;
                }
            }

            self.device.add_framebuffer(
                frame.width,
                frame.height,
                layer.format,
                &handles,
                &pitches,
                &offsets,
                have_modifiers.then_some(&modifiers),
            )
            // `source` drops here, releasing any backend mapping whether
            // or not framebuffer creation succeeded.
        };

        let new_fb = match created {
            Ok(fb_id) => fb_id,
            Err(e) => {
                error!("framebuffer creation failed: {e}");
                return Err(e.into());
            }
        };

        self.apply_color_properties(frame.colorspace, frame.full_range);

        if let Err(e) = self.device.commit_plane(
            self.binding.plane_id,
            self.binding.crtc_id,
            new_fb,
            dst,
            frame.width,
            frame.height,
        ) {
            error!("plane commit failed: {e}");
            self.device.remove_framebuffer(new_fb);
            return Err(e.into());
        }

        // The superseded framebuffer outlives the commit so the display
        // never scans out a destroyed surface.
        let last_fb = self.current_fb;
        self.current_fb = new_fb;
        if last_fb != 0 {
            self.device.remove_framebuffer(last_fb);
        }
        Ok(())
    }

    /// Enters or leaves HDR mode on the connector.
    ///
    /// `metadata` is the session's static metadata; `None` signals a
    /// zero-filled infoframe. Every failure along the way is non-fatal:
    /// the mode transition is attempted once and presentation continues
    /// either way.
    pub fn set_hdr_mode(&mut self, enabled: bool, metadata: Option<&HdrStaticMetadata>) {
        let Some(prop) = &self.hdr_metadata else {
            if enabled {
                warn!("HDR_OUTPUT_METADATA is unavailable on this display, unable to enter HDR mode");
            }
            return;
        };

        // Destroy-before-replace: never hold two metadata blobs.
        if self.hdr_blob != 0 {
            self.device.destroy_property_blob(self.hdr_blob);
            self.hdr_blob = 0;
        }

        if enabled {
            let payload = hdr::output_metadata(metadata);
            match self.device.create_property_blob(hdr::metadata_bytes(&payload)) {
                Ok(blob_id) => self.hdr_blob = blob_id,
                Err(e) => {
                    // Proceed with no metadata attached.
                    error!("HDR metadata blob creation failed: {e}");
                }
            }
        }

        let value = if enabled { u64::from(self.hdr_blob) } else { 0 };
        match self
            .device
            .set_property(self.binding.connector_id, ObjectType::Connector, prop.id, value)
        {
            Ok(()) => info!("set display HDR mode: {}", if enabled { "enabled" } else { "disabled" }),
            Err(e) => error!("failed to set {} property: {e}", prop.name),
        }
    }

    /// Re-evaluates and writes the plane color properties when the frame's
    /// colorspace or range diverges from the last applied values.
    fn apply_color_properties(&mut self, colorspace: Colorspace, full_range: bool) {
        let colorspace_changed = self.color.last_colorspace != Some(colorspace);

        // The range is re-applied on colorspace changes too: across an
        // SDR/HDR transition the last written value may not have stuck.
        if full_range != self.color.last_full_range || colorspace_changed {
            if let Some(prop) = &self.color_range {
                write_plane_enum(&self.device, self.binding.plane_id, prop, color_range_name(full_range));
            }
            self.color.last_full_range = full_range;
        }

        if colorspace_changed {
            if let (Some(prop), Some(desired)) = (&self.color_encoding, color_encoding_name(colorspace)) {
                write_plane_enum(&self.device, self.binding.plane_id, prop, desired);
            }
            self.color.last_colorspace = Some(colorspace);
        }
    }
}

fn write_plane_enum<D: ModeSetting>(device: &D, plane_id: u32, prop: &EnumProperty, desired: &str) {
    match prop.value_for(desired) {
        Some(value) => match device.set_property(plane_id, ObjectType::Plane, prop.id, value) {
            Ok(()) => info!("{}: {desired}", prop.name),
            Err(e) => error!("failed to set {} property: {e}", prop.name),
        },
        None => warn!(
            "unable to find matching {} value for '{desired}', colors may be inaccurate",
            prop.name
        ),
    }
}

impl<D: ModeSetting> Drop for PlaneRenderer<D> {
    fn drop(&mut self) {
        // Leave the display out of HDR mode before releasing anything.
        self.set_hdr_mode(false, None);
        if self.current_fb != 0 {
            self.device.remove_framebuffer(self.current_fb);
            self.current_fb = 0;
        }
        if self.hdr_blob != 0 {
            self.device.destroy_property_blob(self.hdr_blob);
            self.hdr_blob = 0;
        }
        debug!("display plane renderer torn down");
    }
}
