// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use core::fmt;
use drm_sys::DRM_FORMAT_MOD_INVALID;
use std::os::fd::RawFd;

/// NV12 4:2:0 YUV semi-planar format (the common hardware decoder output)
pub const NV12: FourCC = FourCC(*b"NV12");

/// P010 4:2:0 YUV semi-planar 10-bit format (HDR decoder output)
pub const P010: FourCC = FourCC(*b"P010");

/// Rockchip packed 10-bit NV12 variant
pub const NA12: FourCC = FourCC(*b"NA12");

/// Raspberry Pi packed 10-bit 4:2:0 variant
pub const P030: FourCC = FourCC(*b"P030");

/// Four-character pixel format code as used by the mode-setting and DMA-BUF
/// import interfaces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Packed little-endian format code.
    pub const fn code(self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl From<FourCC> for u32 {
    fn from(value: FourCC) -> Self {
        value.code()
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// YCbCr colorspace reported by the decoder for a frame.
///
/// The closed set the presentation path can negotiate; anything else is
/// `Unknown` and skips colorspace negotiation for that frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Colorspace {
    Bt601,
    Bt709,
    Bt2020,
    Unknown,
}

/// Rectangle on the display plane, in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: i32,
    /// Y coordinate of top-left corner
    pub y: i32,
    /// Width of the rectangle in pixels
    pub width: i32,
    /// Height of the rectangle in pixels
    pub height: i32,
}

/// Maximum number of memory objects a PRIME descriptor may reference.
pub const MAX_PRIME_OBJECTS: usize = 4;

/// Maximum number of planes a composed layer may carry.
pub const MAX_PRIME_PLANES: usize = 4;

/// One DMA-BUF-backed memory object referenced by a PRIME descriptor.
///
/// The file descriptor is borrowed from the decoder for the duration of a
/// single call; the presenter never closes it, only imports it.
#[derive(Copy, Clone, Debug)]
pub struct PrimeObject {
    /// DMA-BUF file descriptor exposing the memory object
    pub fd: RawFd,
    /// Total size of the object in bytes
    pub size: usize,
    /// Format modifier, or [`DRM_FORMAT_MOD_INVALID`] for linear/implicit
    pub modifier: u64,
}

impl PrimeObject {
    pub fn has_modifier(&self) -> bool {
        self.modifier != DRM_FORMAT_MOD_INVALID
    }
}

/// One plane of a composed layer, addressing into a [`PrimeObject`].
#[derive(Copy, Clone, Debug)]
pub struct PrimePlane {
    /// Index into [`PrimeDescriptor::objects`]
    pub object_index: usize,
    /// Byte offset of the plane within the object
    pub offset: u32,
    /// Row pitch of the plane in bytes
    pub pitch: u32,
}

/// A composed layer: one presentable surface made of up to four planes.
#[derive(Clone, Debug)]
pub struct PrimeLayer {
    /// Pixel format of the composed surface
    pub format: FourCC,
    pub planes: Vec<PrimePlane>,
}

/// Decoder-produced description of a hardware frame: composed layers
/// referencing DMA-BUF memory objects. Never contains pixel data.
#[derive(Clone, Debug)]
pub struct PrimeDescriptor {
    pub objects: Vec<PrimeObject>,
    pub layers: Vec<PrimeLayer>,
}

impl PrimeDescriptor {
    /// The single composed layer of the frame.
    ///
    /// The display path composes planes in hardware rather than stacking
    /// layers, so a descriptor with more than one layer is a contract
    /// violation by the producer.
    pub fn composed_layer(&self) -> &PrimeLayer {
        assert_eq!(
            self.layers.len(),
            1,
            "PRIME descriptor must carry exactly one composed layer"
        );
        &self.layers[0]
    }

    /// Memory object backing the given plane.
    pub fn object(&self, plane: &PrimePlane) -> &PrimeObject {
        &self.objects[plane.object_index]
    }
}

/// One decoded video frame handed to the presenter.
///
/// Borrowed for the duration of a call; the presenter only takes ownership
/// of resources it derives from it (buffer handles, framebuffer objects),
/// never of the frame or its file descriptors.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub colorspace: Colorspace,
    pub full_range: bool,
    /// Device-native PRIME descriptor, absent when the decoder output
    /// needs a composing backend to map it first.
    pub prime: Option<PrimeDescriptor>,
}

impl fmt::Display for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {:?} {}",
            self.width,
            self.height,
            self.colorspace,
            if self.full_range { "full" } else { "limited" },
        )
    }
}
