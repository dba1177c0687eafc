// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

//! Dynamically-loaded FFI bindings for `libdrm.so.2`.
//!
//! Only the subset of the mode-setting API used for plane presentation is
//! bound: resource/connector/encoder/CRTC/plane enumeration, object
//! properties, framebuffer import and removal, plane commits, property
//! blobs, and PRIME buffer import. The bindings follow the bindgen
//! `--dynamic-loading` shape so call sites read the same as generated code.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

use libc::{c_char, c_int, c_uint, c_void, size_t};

pub const DRM_PROP_NAME_LEN: usize = 32;
pub const DRM_DISPLAY_MODE_LEN: usize = 32;

pub const DRM_CLIENT_CAP_UNIVERSAL_PLANES: u64 = 2;
pub const DRM_CLIENT_CAP_ATOMIC: u64 = 3;

pub const DRM_MODE_OBJECT_CRTC: u32 = 0xcccccccc;
pub const DRM_MODE_OBJECT_CONNECTOR: u32 = 0xc0c0c0c0;
pub const DRM_MODE_OBJECT_ENCODER: u32 = 0xe0e0e0e0;
pub const DRM_MODE_OBJECT_PLANE: u32 = 0xeeeeeeee;
pub const DRM_MODE_OBJECT_PROPERTY: u32 = 0xb0b0b0b0;

pub const DRM_MODE_FB_MODIFIERS: u32 = 1 << 1;

/// Sentinel modifier: the buffer layout carries no modifier metadata.
pub const DRM_FORMAT_MOD_INVALID: u64 = 0x00ff_ffff_ffff_ffff;

pub const DRM_PLANE_TYPE_OVERLAY: u64 = 0;
pub const DRM_PLANE_TYPE_PRIMARY: u64 = 1;
pub const DRM_PLANE_TYPE_CURSOR: u64 = 2;

pub type drmModeConnection = c_uint;
pub const drmModeConnection_DRM_MODE_CONNECTED: drmModeConnection = 1;
pub const drmModeConnection_DRM_MODE_DISCONNECTED: drmModeConnection = 2;
pub const drmModeConnection_DRM_MODE_UNKNOWNCONNECTION: drmModeConnection = 3;

pub type drmModeSubPixel = c_uint;

pub const fn fourcc_code(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | (b as u32) << 8 | (c as u32) << 16 | (d as u32) << 24
}

pub const DRM_FORMAT_NV12: u32 = fourcc_code(b'N', b'V', b'1', b'2');
pub const DRM_FORMAT_P010: u32 = fourcc_code(b'P', b'0', b'1', b'0');
/// Rockchip 10-bit NV12 variant.
pub const DRM_FORMAT_NV12_10: u32 = fourcc_code(b'N', b'A', b'1', b'2');
/// Raspberry Pi packed 10-bit 4:2:0 variant.
pub const DRM_FORMAT_P030: u32 = fourcc_code(b'P', b'0', b'3', b'0');
pub const DRM_FORMAT_XRGB8888: u32 = fourcc_code(b'X', b'R', b'2', b'4');

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModeRes {
    pub count_fbs: c_int,
    pub fbs: *mut u32,
    pub count_crtcs: c_int,
    pub crtcs: *mut u32,
    pub count_connectors: c_int,
    pub connectors: *mut u32,
    pub count_encoders: c_int,
    pub encoders: *mut u32,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}
pub type drmModeRes = _drmModeRes;
pub type drmModeResPtr = *mut _drmModeRes;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModeModeInfo {
    pub clock: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub hskew: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub vscan: u16,
    pub vrefresh: u32,
    pub flags: u32,
    pub type_: u32,
    pub name: [c_char; DRM_DISPLAY_MODE_LEN],
}
pub type drmModeModeInfo = _drmModeModeInfo;
pub type drmModeModeInfoPtr = *mut _drmModeModeInfo;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModeConnector {
    pub connector_id: u32,
    /// Encoder currently connected to the connector, 0 if none.
    pub encoder_id: u32,
    pub connector_type: u32,
    pub connector_type_id: u32,
    pub connection: drmModeConnection,
    pub mmWidth: u32,
    pub mmHeight: u32,
    pub subpixel: drmModeSubPixel,
    pub count_modes: c_int,
    pub modes: drmModeModeInfoPtr,
    pub count_props: c_int,
    pub props: *mut u32,
    pub prop_values: *mut u64,
    pub count_encoders: c_int,
    pub encoders: *mut u32,
}
pub type drmModeConnector = _drmModeConnector;
pub type drmModeConnectorPtr = *mut _drmModeConnector;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModeEncoder {
    pub encoder_id: u32,
    pub encoder_type: u32,
    pub crtc_id: u32,
    pub possible_crtcs: u32,
    pub possible_clones: u32,
}
pub type drmModeEncoder = _drmModeEncoder;
pub type drmModeEncoderPtr = *mut _drmModeEncoder;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModeCrtc {
    pub crtc_id: u32,
    pub buffer_id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub mode_valid: c_int,
    pub mode: drmModeModeInfo,
    pub gamma_size: c_int,
}
pub type drmModeCrtc = _drmModeCrtc;
pub type drmModeCrtcPtr = *mut _drmModeCrtc;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModePlaneRes {
    pub count_planes: u32,
    pub planes: *mut u32,
}
pub type drmModePlaneRes = _drmModePlaneRes;
pub type drmModePlaneResPtr = *mut _drmModePlaneRes;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModePlane {
    pub count_formats: u32,
    pub formats: *mut u32,
    pub plane_id: u32,
    pub crtc_id: u32,
    pub fb_id: u32,
    pub crtc_x: u32,
    pub crtc_y: u32,
    pub x: u32,
    pub y: u32,
    pub possible_crtcs: u32,
    pub gamma_size: u32,
}
pub type drmModePlane = _drmModePlane;
pub type drmModePlanePtr = *mut _drmModePlane;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct drm_mode_property_enum {
    pub value: u64,
    pub name: [c_char; DRM_PROP_NAME_LEN],
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModeProperty {
    pub prop_id: u32,
    pub flags: u32,
    pub name: [c_char; DRM_PROP_NAME_LEN],
    pub count_values: c_int,
    pub values: *mut u64,
    pub count_enums: c_int,
    pub enums: *mut drm_mode_property_enum,
    pub count_blobs: c_int,
    pub blob_ids: *mut u32,
}
pub type drmModePropertyRes = _drmModeProperty;
pub type drmModePropertyPtr = *mut _drmModeProperty;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _drmModeObjectProperties {
    pub count_props: u32,
    pub props: *mut u32,
    pub prop_values: *mut u64,
}
pub type drmModeObjectProperties = _drmModeObjectProperties;
pub type drmModeObjectPropertiesPtr = *mut _drmModeObjectProperties;

pub const HDMI_STATIC_METADATA_TYPE1: u32 = 0;
pub const HDMI_EOTF_TRADITIONAL_GAMMA_SDR: u8 = 0;
pub const HDMI_EOTF_TRADITIONAL_GAMMA_HDR: u8 = 1;
pub const HDMI_EOTF_SMPTE_ST2084: u8 = 2;
pub const HDMI_EOTF_BT_2100_HLG: u8 = 3;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct hdr_metadata_infoframe__bindgen_ty_1 {
    pub x: u16,
    pub y: u16,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct hdr_metadata_infoframe {
    pub eotf: u8,
    pub metadata_type: u8,
    pub display_primaries: [hdr_metadata_infoframe__bindgen_ty_1; 3],
    pub white_point: hdr_metadata_infoframe__bindgen_ty_1,
    pub max_display_mastering_luminance: u16,
    pub min_display_mastering_luminance: u16,
    pub max_cll: u16,
    pub max_fall: u16,
}

// The kernel declares the payload as a single-member union; flattened here
// so the one member stays safely accessible. Layout is unchanged.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct hdr_output_metadata {
    pub metadata_type: u32,
    pub hdmi_metadata_type1: hdr_metadata_infoframe,
}

pub struct drm {
    __library: ::libloading::Library,
    pub drmSetClientCap:
        Result<unsafe extern "C" fn(fd: c_int, capability: u64, value: u64) -> c_int, ::libloading::Error>,
    pub drmModeGetResources:
        Result<unsafe extern "C" fn(fd: c_int) -> drmModeResPtr, ::libloading::Error>,
    pub drmModeFreeResources:
        Result<unsafe extern "C" fn(ptr: drmModeResPtr), ::libloading::Error>,
    pub drmModeGetConnector:
        Result<unsafe extern "C" fn(fd: c_int, connectorId: u32) -> drmModeConnectorPtr, ::libloading::Error>,
    pub drmModeFreeConnector:
        Result<unsafe extern "C" fn(ptr: drmModeConnectorPtr), ::libloading::Error>,
    pub drmModeGetEncoder:
        Result<unsafe extern "C" fn(fd: c_int, encoder_id: u32) -> drmModeEncoderPtr, ::libloading::Error>,
    pub drmModeFreeEncoder:
        Result<unsafe extern "C" fn(ptr: drmModeEncoderPtr), ::libloading::Error>,
    pub drmModeGetCrtc:
        Result<unsafe extern "C" fn(fd: c_int, crtcId: u32) -> drmModeCrtcPtr, ::libloading::Error>,
    pub drmModeFreeCrtc:
        Result<unsafe extern "C" fn(ptr: drmModeCrtcPtr), ::libloading::Error>,
    pub drmModeGetPlaneResources:
        Result<unsafe extern "C" fn(fd: c_int) -> drmModePlaneResPtr, ::libloading::Error>,
    pub drmModeFreePlaneResources:
        Result<unsafe extern "C" fn(ptr: drmModePlaneResPtr), ::libloading::Error>,
    pub drmModeGetPlane:
        Result<unsafe extern "C" fn(fd: c_int, plane_id: u32) -> drmModePlanePtr, ::libloading::Error>,
    pub drmModeFreePlane:
        Result<unsafe extern "C" fn(ptr: drmModePlanePtr), ::libloading::Error>,
    pub drmModeObjectGetProperties: Result<
        unsafe extern "C" fn(fd: c_int, object_id: u32, object_type: u32) -> drmModeObjectPropertiesPtr,
        ::libloading::Error,
    >,
    pub drmModeFreeObjectProperties:
        Result<unsafe extern "C" fn(ptr: drmModeObjectPropertiesPtr), ::libloading::Error>,
    pub drmModeGetProperty:
        Result<unsafe extern "C" fn(fd: c_int, propertyId: u32) -> drmModePropertyPtr, ::libloading::Error>,
    pub drmModeFreeProperty:
        Result<unsafe extern "C" fn(ptr: drmModePropertyPtr), ::libloading::Error>,
    pub drmModeObjectSetProperty: Result<
        unsafe extern "C" fn(fd: c_int, object_id: u32, object_type: u32, property_id: u32, value: u64) -> c_int,
        ::libloading::Error,
    >,
    pub drmModeAddFB2WithModifiers: Result<
        unsafe extern "C" fn(
            fd: c_int,
            width: u32,
            height: u32,
            pixel_format: u32,
            bo_handles: *const u32,
            pitches: *const u32,
            offsets: *const u32,
            modifier: *const u64,
            buf_id: *mut u32,
            flags: u32,
        ) -> c_int,
        ::libloading::Error,
    >,
    pub drmModeRmFB: Result<unsafe extern "C" fn(fd: c_int, bufferId: u32) -> c_int, ::libloading::Error>,
    pub drmModeSetPlane: Result<
        unsafe extern "C" fn(
            fd: c_int,
            plane_id: u32,
            crtc_id: u32,
            fb_id: u32,
            flags: u32,
            crtc_x: i32,
            crtc_y: i32,
            crtc_w: u32,
            crtc_h: u32,
            src_x: u32,
            src_y: u32,
            src_w: u32,
            src_h: u32,
        ) -> c_int,
        ::libloading::Error,
    >,
    pub drmModeCreatePropertyBlob: Result<
        unsafe extern "C" fn(fd: c_int, data: *const c_void, size: size_t, id: *mut u32) -> c_int,
        ::libloading::Error,
    >,
    pub drmModeDestroyPropertyBlob:
        Result<unsafe extern "C" fn(fd: c_int, id: u32) -> c_int, ::libloading::Error>,
    pub drmPrimeFDToHandle: Result<
        unsafe extern "C" fn(fd: c_int, prime_fd: c_int, handle: *mut u32) -> c_int,
        ::libloading::Error,
    >,
}

impl drm {
    /// # Safety
    ///
    /// The loaded library must export the bound symbols with the declared
    /// signatures, which holds for every released libdrm.
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: AsRef<::std::ffi::OsStr>,
    {
        let library = ::libloading::Library::new(path)?;
        Self::from_library(library)
    }

    /// # Safety
    ///
    /// See [`drm::new`].
    pub unsafe fn from_library(library: ::libloading::Library) -> Result<Self, ::libloading::Error> {
        let __library = library;
        let drmSetClientCap = __library.get(b"drmSetClientCap\0").map(|sym| *sym);
        let drmModeGetResources = __library.get(b"drmModeGetResources\0").map(|sym| *sym);
        let drmModeFreeResources = __library.get(b"drmModeFreeResources\0").map(|sym| *sym);
        let drmModeGetConnector = __library.get(b"drmModeGetConnector\0").map(|sym| *sym);
        let drmModeFreeConnector = __library.get(b"drmModeFreeConnector\0").map(|sym| *sym);
        let drmModeGetEncoder = __library.get(b"drmModeGetEncoder\0").map(|sym| *sym);
        let drmModeFreeEncoder = __library.get(b"drmModeFreeEncoder\0").map(|sym| *sym);
        let drmModeGetCrtc = __library.get(b"drmModeGetCrtc\0").map(|sym| *sym);
        let drmModeFreeCrtc = __library.get(b"drmModeFreeCrtc\0").map(|sym| *sym);
        let drmModeGetPlaneResources = __library.get(b"drmModeGetPlaneResources\0").map(|sym| *sym);
        let drmModeFreePlaneResources = __library.get(b"drmModeFreePlaneResources\0").map(|sym| *sym);
        let drmModeGetPlane = __library.get(b"drmModeGetPlane\0").map(|sym| *sym);
        let drmModeFreePlane = __library.get(b"drmModeFreePlane\0").map(|sym| *sym);
        let drmModeObjectGetProperties = __library.get(b"drmModeObjectGetProperties\0").map(|sym| *sym);
        let drmModeFreeObjectProperties = __library.get(b"drmModeFreeObjectProperties\0").map(|sym| *sym);
        let drmModeGetProperty = __library.get(b"drmModeGetProperty\0").map(|sym| *sym);
        let drmModeFreeProperty = __library.get(b"drmModeFreeProperty\0").map(|sym| *sym);
        let drmModeObjectSetProperty = __library.get(b"drmModeObjectSetProperty\0").map(|sym| *sym);
        let drmModeAddFB2WithModifiers = __library.get(b"drmModeAddFB2WithModifiers\0").map(|sym| *sym);
        let drmModeRmFB = __library.get(b"drmModeRmFB\0").map(|sym| *sym);
        let drmModeSetPlane = __library.get(b"drmModeSetPlane\0").map(|sym| *sym);
        let drmModeCreatePropertyBlob = __library.get(b"drmModeCreatePropertyBlob\0").map(|sym| *sym);
        let drmModeDestroyPropertyBlob = __library.get(b"drmModeDestroyPropertyBlob\0").map(|sym| *sym);
        let drmPrimeFDToHandle = __library.get(b"drmPrimeFDToHandle\0").map(|sym| *sym);
        Ok(drm {
            __library,
            drmSetClientCap,
            drmModeGetResources,
            drmModeFreeResources,
            drmModeGetConnector,
            drmModeFreeConnector,
            drmModeGetEncoder,
            drmModeFreeEncoder,
            drmModeGetCrtc,
            drmModeFreeCrtc,
            drmModeGetPlaneResources,
            drmModeFreePlaneResources,
            drmModeGetPlane,
            drmModeFreePlane,
            drmModeObjectGetProperties,
            drmModeFreeObjectProperties,
            drmModeGetProperty,
            drmModeFreeProperty,
            drmModeObjectSetProperty,
            drmModeAddFB2WithModifiers,
            drmModeRmFB,
            drmModeSetPlane,
            drmModeCreatePropertyBlob,
            drmModeDestroyPropertyBlob,
            drmPrimeFDToHandle,
        })
    }

    pub unsafe fn drmSetClientCap(&self, fd: c_int, capability: u64, value: u64) -> c_int {
        (self
            .drmSetClientCap
            .as_ref()
            .expect("Expected function, got error."))(fd, capability, value)
    }

    pub unsafe fn drmModeGetResources(&self, fd: c_int) -> drmModeResPtr {
        (self
            .drmModeGetResources
            .as_ref()
            .expect("Expected function, got error."))(fd)
    }

    pub unsafe fn drmModeFreeResources(&self, ptr: drmModeResPtr) {
        (self
            .drmModeFreeResources
            .as_ref()
            .expect("Expected function, got error."))(ptr)
    }

    pub unsafe fn drmModeGetConnector(&self, fd: c_int, connectorId: u32) -> drmModeConnectorPtr {
        (self
            .drmModeGetConnector
            .as_ref()
            .expect("Expected function, got error."))(fd, connectorId)
    }

    pub unsafe fn drmModeFreeConnector(&self, ptr: drmModeConnectorPtr) {
        (self
            .drmModeFreeConnector
            .as_ref()
            .expect("Expected function, got error."))(ptr)
    }

    pub unsafe fn drmModeGetEncoder(&self, fd: c_int, encoder_id: u32) -> drmModeEncoderPtr {
        (self
            .drmModeGetEncoder
            .as_ref()
            .expect("Expected function, got error."))(fd, encoder_id)
    }

    pub unsafe fn drmModeFreeEncoder(&self, ptr: drmModeEncoderPtr) {
        (self
            .drmModeFreeEncoder
            .as_ref()
            .expect("Expected function, got error."))(ptr)
    }

    pub unsafe fn drmModeGetCrtc(&self, fd: c_int, crtcId: u32) -> drmModeCrtcPtr {
        (self
            .drmModeGetCrtc
            .as_ref()
            .expect("Expected function, got error."))(fd, crtcId)
    }

    pub unsafe fn drmModeFreeCrtc(&self, ptr: drmModeCrtcPtr) {
        (self
            .drmModeFreeCrtc
            .as_ref()
            .expect("Expected function, got error."))(ptr)
    }

    pub unsafe fn drmModeGetPlaneResources(&self, fd: c_int) -> drmModePlaneResPtr {
        (self
            .drmModeGetPlaneResources
            .as_ref()
            .expect("Expected function, got error."))(fd)
    }

    pub unsafe fn drmModeFreePlaneResources(&self, ptr: drmModePlaneResPtr) {
        (self
            .drmModeFreePlaneResources
            .as_ref()
            .expect("Expected function, got error."))(ptr)
    }

    pub unsafe fn drmModeGetPlane(&self, fd: c_int, plane_id: u32) -> drmModePlanePtr {
        (self
            .drmModeGetPlane
            .as_ref()
            .expect("Expected function, got error."))(fd, plane_id)
    }

    pub unsafe fn drmModeFreePlane(&self, ptr: drmModePlanePtr) {
        (self
            .drmModeFreePlane
            .as_ref()
            .expect("Expected function, got error."))(ptr)
    }

    pub unsafe fn drmModeObjectGetProperties(
        &self,
        fd: c_int,
        object_id: u32,
        object_type: u32,
    ) -> drmModeObjectPropertiesPtr {
        (self
            .drmModeObjectGetProperties
            .as_ref()
            .expect("Expected function, got error."))(fd, object_id, object_type)
    }

    pub unsafe fn drmModeFreeObjectProperties(&self, ptr: drmModeObjectPropertiesPtr) {
        (self
            .drmModeFreeObjectProperties
            .as_ref()
            .expect("Expected function, got error."))(ptr)
    }

    pub unsafe fn drmModeGetProperty(&self, fd: c_int, propertyId: u32) -> drmModePropertyPtr {
        (self
            .drmModeGetProperty
            .as_ref()
            .expect("Expected function, got error."))(fd, propertyId)
    }

    pub unsafe fn drmModeFreeProperty(&self, ptr: drmModePropertyPtr) {
        (self
            .drmModeFreeProperty
            .as_ref()
            .expect("Expected function, got error."))(ptr)
    }

    pub unsafe fn drmModeObjectSetProperty(
        &self,
        fd: c_int,
        object_id: u32,
        object_type: u32,
        property_id: u32,
        value: u64,
    ) -> c_int {
        (self
            .drmModeObjectSetProperty
            .as_ref()
            .expect("Expected function, got error."))(fd, object_id, object_type, property_id, value)
    }

    #[allow(clippy::too_many_arguments)]
    pub unsafe fn drmModeAddFB2WithModifiers(
        &self,
        fd: c_int,
        width: u32,
        height: u32,
        pixel_format: u32,
        bo_handles: *const u32,
        pitches: *const u32,
        offsets: *const u32,
        modifier: *const u64,
        buf_id: *mut u32,
        flags: u32,
    ) -> c_int {
        (self
            .drmModeAddFB2WithModifiers
            .as_ref()
            .expect("Expected function, got error."))(
            fd, width, height, pixel_format, bo_handles, pitches, offsets, modifier, buf_id, flags,
        )
    }

    pub unsafe fn drmModeRmFB(&self, fd: c_int, bufferId: u32) -> c_int {
        (self
            .drmModeRmFB
            .as_ref()
            .expect("Expected function, got error."))(fd, bufferId)
    }

    #[allow(clippy::too_many_arguments)]
    pub unsafe fn drmModeSetPlane(
        &self,
        fd: c_int,
        plane_id: u32,
        crtc_id: u32,
        fb_id: u32,
        flags: u32,
        crtc_x: i32,
        crtc_y: i32,
        crtc_w: u32,
        crtc_h: u32,
        src_x: u32,
        src_y: u32,
        src_w: u32,
        src_h: u32,
    ) -> c_int {
        (self
            .drmModeSetPlane
            .as_ref()
            .expect("Expected function, got error."))(
            fd, plane_id, crtc_id, fb_id, flags, crtc_x, crtc_y, crtc_w, crtc_h, src_x, src_y, src_w,
            src_h,
        )
    }

    pub unsafe fn drmModeCreatePropertyBlob(
        &self,
        fd: c_int,
        data: *const c_void,
        size: size_t,
        id: *mut u32,
    ) -> c_int {
        (self
            .drmModeCreatePropertyBlob
            .as_ref()
            .expect("Expected function, got error."))(fd, data, size, id)
    }

    pub unsafe fn drmModeDestroyPropertyBlob(&self, fd: c_int, id: u32) -> c_int {
        (self
            .drmModeDestroyPropertyBlob
            .as_ref()
            .expect("Expected function, got error."))(fd, id)
    }

    pub unsafe fn drmPrimeFDToHandle(&self, fd: c_int, prime_fd: c_int, handle: *mut u32) -> c_int {
        (self
            .drmPrimeFDToHandle
            .as_ref()
            .expect("Expected function, got error."))(fd, prime_fd, handle)
    }
}
