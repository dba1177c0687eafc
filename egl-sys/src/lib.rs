// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

//! Dynamically-loaded FFI bindings for `libEGL.so.1`.
//!
//! Binds only the entry points needed to bootstrap DMA-BUF image import:
//! extension queries, error retrieval, and `eglGetProcAddress` for
//! resolving the image create/destroy families at runtime. The attribute
//! constants cover `EGL_EXT_image_dma_buf_import` and its modifiers
//! variant.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

use libc::{c_char, c_uint, c_void};

pub type EGLBoolean = c_uint;
pub type EGLint = i32;
pub type EGLenum = c_uint;
pub type EGLAttrib = isize;
pub type EGLDisplay = *mut c_void;
pub type EGLContext = *mut c_void;
pub type EGLImage = *mut c_void;
pub type EGLImageKHR = EGLImage;
pub type EGLClientBuffer = *mut c_void;
pub type __eglMustCastToProperFunctionPointerType = Option<unsafe extern "C" fn()>;

pub const EGL_NO_CONTEXT: EGLContext = ::std::ptr::null_mut();
pub const EGL_NO_IMAGE: EGLImage = ::std::ptr::null_mut();

pub const EGL_NONE: u32 = 0x3038;
pub const EGL_EXTENSIONS: u32 = 0x3055;
pub const EGL_HEIGHT: u32 = 0x3056;
pub const EGL_WIDTH: u32 = 0x3057;

pub const EGL_LINUX_DMA_BUF_EXT: u32 = 0x3270;
pub const EGL_LINUX_DRM_FOURCC_EXT: u32 = 0x3271;
pub const EGL_DMA_BUF_PLANE0_FD_EXT: u32 = 0x3272;
pub const EGL_DMA_BUF_PLANE0_OFFSET_EXT: u32 = 0x3273;
pub const EGL_DMA_BUF_PLANE0_PITCH_EXT: u32 = 0x3274;
pub const EGL_DMA_BUF_PLANE1_FD_EXT: u32 = 0x3275;
pub const EGL_DMA_BUF_PLANE1_OFFSET_EXT: u32 = 0x3276;
pub const EGL_DMA_BUF_PLANE1_PITCH_EXT: u32 = 0x3277;
pub const EGL_DMA_BUF_PLANE2_FD_EXT: u32 = 0x3278;
pub const EGL_DMA_BUF_PLANE2_OFFSET_EXT: u32 = 0x3279;
pub const EGL_DMA_BUF_PLANE2_PITCH_EXT: u32 = 0x327A;
pub const EGL_YUV_COLOR_SPACE_HINT_EXT: u32 = 0x327B;
pub const EGL_SAMPLE_RANGE_HINT_EXT: u32 = 0x327C;
pub const EGL_YUV_CHROMA_HORIZONTAL_SITING_HINT_EXT: u32 = 0x327D;
pub const EGL_YUV_CHROMA_VERTICAL_SITING_HINT_EXT: u32 = 0x327E;
pub const EGL_ITU_REC601_EXT: u32 = 0x327F;
pub const EGL_ITU_REC709_EXT: u32 = 0x3280;
pub const EGL_ITU_REC2020_EXT: u32 = 0x3281;
pub const EGL_YUV_FULL_RANGE_EXT: u32 = 0x3282;
pub const EGL_YUV_NARROW_RANGE_EXT: u32 = 0x3283;

pub const EGL_DMA_BUF_PLANE3_FD_EXT: u32 = 0x3440;
pub const EGL_DMA_BUF_PLANE3_OFFSET_EXT: u32 = 0x3441;
pub const EGL_DMA_BUF_PLANE3_PITCH_EXT: u32 = 0x3442;
pub const EGL_DMA_BUF_PLANE0_MODIFIER_LO_EXT: u32 = 0x3443;
pub const EGL_DMA_BUF_PLANE0_MODIFIER_HI_EXT: u32 = 0x3444;
pub const EGL_DMA_BUF_PLANE1_MODIFIER_LO_EXT: u32 = 0x3445;
pub const EGL_DMA_BUF_PLANE1_MODIFIER_HI_EXT: u32 = 0x3446;
pub const EGL_DMA_BUF_PLANE2_MODIFIER_LO_EXT: u32 = 0x3447;
pub const EGL_DMA_BUF_PLANE2_MODIFIER_HI_EXT: u32 = 0x3448;
pub const EGL_DMA_BUF_PLANE3_MODIFIER_LO_EXT: u32 = 0x3449;
pub const EGL_DMA_BUF_PLANE3_MODIFIER_HI_EXT: u32 = 0x344A;

pub type PFNEGLCREATEIMAGEPROC = unsafe extern "C" fn(
    dpy: EGLDisplay,
    ctx: EGLContext,
    target: EGLenum,
    buffer: EGLClientBuffer,
    attrib_list: *const EGLAttrib,
) -> EGLImage;

pub type PFNEGLCREATEIMAGEKHRPROC = unsafe extern "C" fn(
    dpy: EGLDisplay,
    ctx: EGLContext,
    target: EGLenum,
    buffer: EGLClientBuffer,
    attrib_list: *const EGLint,
) -> EGLImageKHR;

pub type PFNEGLDESTROYIMAGEPROC = unsafe extern "C" fn(dpy: EGLDisplay, image: EGLImage) -> EGLBoolean;

pub type PFNEGLDESTROYIMAGEKHRPROC =
    unsafe extern "C" fn(dpy: EGLDisplay, image: EGLImageKHR) -> EGLBoolean;

pub struct egl {
    __library: ::libloading::Library,
    pub eglGetProcAddress: Result<
        unsafe extern "C" fn(procname: *const c_char) -> __eglMustCastToProperFunctionPointerType,
        ::libloading::Error,
    >,
    pub eglQueryString:
        Result<unsafe extern "C" fn(dpy: EGLDisplay, name: EGLint) -> *const c_char, ::libloading::Error>,
    pub eglGetError: Result<unsafe extern "C" fn() -> EGLint, ::libloading::Error>,
}

impl egl {
    /// # Safety
    ///
    /// The loaded library must export the bound symbols with the declared
    /// signatures, which holds for every conforming EGL client library.
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: AsRef<::std::ffi::OsStr>,
    {
        let library = ::libloading::Library::new(path)?;
        Self::from_library(library)
    }

    /// # Safety
    ///
    /// See [`egl::new`].
    pub unsafe fn from_library(library: ::libloading::Library) -> Result<Self, ::libloading::Error> {
        let __library = library;
        let eglGetProcAddress = __library.get(b"eglGetProcAddress\0").map(|sym| *sym);
        let eglQueryString = __library.get(b"eglQueryString\0").map(|sym| *sym);
        let eglGetError = __library.get(b"eglGetError\0").map(|sym| *sym);
        Ok(egl {
            __library,
            eglGetProcAddress,
            eglQueryString,
            eglGetError,
        })
    }

    pub unsafe fn eglGetProcAddress(
        &self,
        procname: *const c_char,
    ) -> __eglMustCastToProperFunctionPointerType {
        (self
            .eglGetProcAddress
            .as_ref()
            .expect("Expected function, got error."))(procname)
    }

    pub unsafe fn eglQueryString(&self, dpy: EGLDisplay, name: EGLint) -> *const c_char {
        (self
            .eglQueryString
            .as_ref()
            .expect("Expected function, got error."))(dpy, name)
    }

    pub unsafe fn eglGetError(&self) -> EGLint {
        (self
            .eglGetError
            .as_ref()
            .expect("Expected function, got error."))()
    }
}
