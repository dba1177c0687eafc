// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use crate::frame::{Colorspace, PrimeDescriptor, VideoFrame, MAX_PRIME_PLANES};
use egl_sys::{
    egl as egl_library, EGLAttrib, EGLDisplay, EGLImage, EGLint, PFNEGLCREATEIMAGEKHRPROC,
    PFNEGLCREATEIMAGEPROC, PFNEGLDESTROYIMAGEKHRPROC, PFNEGLDESTROYIMAGEPROC,
    EGL_DMA_BUF_PLANE0_FD_EXT, EGL_DMA_BUF_PLANE0_MODIFIER_HI_EXT, EGL_DMA_BUF_PLANE0_MODIFIER_LO_EXT,
    EGL_DMA_BUF_PLANE0_OFFSET_EXT, EGL_DMA_BUF_PLANE0_PITCH_EXT, EGL_DMA_BUF_PLANE1_FD_EXT,
    EGL_DMA_BUF_PLANE1_MODIFIER_HI_EXT, EGL_DMA_BUF_PLANE1_MODIFIER_LO_EXT,
    EGL_DMA_BUF_PLANE1_OFFSET_EXT, EGL_DMA_BUF_PLANE1_PITCH_EXT, EGL_DMA_BUF_PLANE2_FD_EXT,
    EGL_DMA_BUF_PLANE2_MODIFIER_HI_EXT, EGL_DMA_BUF_PLANE2_MODIFIER_LO_EXT,
    EGL_DMA_BUF_PLANE2_OFFSET_EXT, EGL_DMA_BUF_PLANE2_PITCH_EXT, EGL_DMA_BUF_PLANE3_FD_EXT,
    EGL_DMA_BUF_PLANE3_MODIFIER_HI_EXT, EGL_DMA_BUF_PLANE3_MODIFIER_LO_EXT,
    EGL_DMA_BUF_PLANE3_OFFSET_EXT, EGL_DMA_BUF_PLANE3_PITCH_EXT, EGL_EXTENSIONS, EGL_HEIGHT,
    EGL_ITU_REC2020_EXT, EGL_ITU_REC601_EXT, EGL_ITU_REC709_EXT, EGL_LINUX_DMA_BUF_EXT,
    EGL_LINUX_DRM_FOURCC_EXT, EGL_NONE, EGL_NO_CONTEXT, EGL_SAMPLE_RANGE_HINT_EXT, EGL_WIDTH,
    EGL_YUV_COLOR_SPACE_HINT_EXT, EGL_YUV_FULL_RANGE_EXT, EGL_YUV_NARROW_RANGE_EXT,
};
use std::{
    collections::HashSet,
    error::Error,
    ffi::{CStr, CString},
    io, mem,
    ptr::null_mut,
};
use tracing::{debug, error};

/// Extension set advertised by an EGL display.
pub struct EglExtensions(HashSet<String>);

impl EglExtensions {
    /// Query the display's extension string.
    ///
    /// # Errors
    ///
    /// Fails when the display is invalid or not initialized.
    pub fn query(egl: &egl_library, display: EGLDisplay) -> Result<Self, Box<dyn Error>> {
        let raw = unsafe { egl.eglQueryString(display, EGL_EXTENSIONS as EGLint) };
        if raw.is_null() {
            return Err(io::Error::other("eglQueryString(EGL_EXTENSIONS) failed").into());
        }
        let all = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        Ok(Self(all.split_whitespace().map(str::to_owned).collect()))
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

/// The image create/destroy family resolved at setup.
///
/// The unsuffixed pair takes `EGLAttrib` lists, the KHR pair `EGLint`
/// lists; whichever pair resolves completely is chosen once and used for
/// both creation and destruction.
#[derive(Copy, Clone)]
enum ImageApi {
    Stable {
        create: PFNEGLCREATEIMAGEPROC,
        destroy: PFNEGLDESTROYIMAGEPROC,
    },
    Khr {
        create: PFNEGLCREATEIMAGEKHRPROC,
        destroy: PFNEGLDESTROYIMAGEKHRPROC,
    },
}

/// Exports device-native frames as single opaque GPU images for a
/// compositing renderer to sample.
pub struct EglExporter {
    egl: egl_library,
    display: EGLDisplay,
    api: ImageApi,
    has_modifier_import: bool,
}

impl EglExporter {
    /// Verifies DMA-BUF import support on `display` and resolves the image
    /// entry points.
    ///
    /// # Errors
    ///
    /// Fails when the base `EGL_EXT_image_dma_buf_import` extension is
    /// missing or no complete create/destroy pair resolves; either makes
    /// this path unusable for the session.
    pub fn new(display: EGLDisplay) -> Result<Self, Box<dyn Error>> {
        let egl = unsafe { egl_library::new("libEGL.so.1") }?;

        let extensions = EglExtensions::query(&egl, display)?;
        if !extensions.is_supported("EGL_EXT_image_dma_buf_import") {
            return Err(io::Error::other("EGL display does not support DMA-BUF import").into());
        }
        let has_modifier_import = extensions.is_supported("EGL_EXT_image_dma_buf_import_modifiers");
        debug!("DMA-BUF modifier import: {has_modifier_import}");

        // eglCreateImage() and eglCreateImageKHR() take differently-typed
        // attribute lists, so the pair must never be mixed.
        let create = resolve(&egl, "eglCreateImage");
        let destroy = resolve(&egl, "eglDestroyImage");
        let create_khr = resolve(&egl, "eglCreateImageKHR");
        let destroy_khr = resolve(&egl, "eglDestroyImageKHR");

        let api = if let (Some(create), Some(destroy)) = (create, destroy) {
            ImageApi::Stable {
                create: unsafe { mem::transmute::<unsafe extern "C" fn(), PFNEGLCREATEIMAGEPROC>(create) },
                destroy: unsafe {
                    mem::transmute::<unsafe extern "C" fn(), PFNEGLDESTROYIMAGEPROC>(destroy)
                },
            }
        } else if let (Some(create), Some(destroy)) = (create_khr, destroy_khr) {
            ImageApi::Khr {
                create: unsafe {
                    mem::transmute::<unsafe extern "C" fn(), PFNEGLCREATEIMAGEKHRPROC>(create)
                },
                destroy: unsafe {
                    mem::transmute::<unsafe extern "C" fn(), PFNEGLDESTROYIMAGEKHRPROC>(destroy)
                },
            }
        } else {
            return Err(io::Error::other("missing eglCreateImage()/eglDestroyImage() in EGL driver").into());
        };

        Ok(Self {
            egl,
            display,
            api,
            has_modifier_import,
        })
    }

    pub fn has_modifier_import(&self) -> bool {
        self.has_modifier_import
    }

    /// Builds one opaque GPU image over the frame's DMA objects.
    ///
    /// The frame must already be device-native. The returned image is
    /// owned by the caller until passed to
    /// [`destroy_image`](EglExporter::destroy_image).
    ///
    /// # Errors
    ///
    /// Image creation failure is fatal to this frame only.
    pub fn export_image(&self, frame: &VideoFrame) -> Result<EGLImage, Box<dyn Error>> {
        let descriptor = frame
            .prime
            .as_ref()
            .ok_or("frame is not in device-native form")?;

        let attribs = image_attributes(
            descriptor,
            frame.width,
            frame.height,
            frame.colorspace,
            frame.full_range,
            self.has_modifier_import,
        );

        let image = match self.api {
            ImageApi::Stable { create, .. } => unsafe {
                create(
                    self.display,
                    EGL_NO_CONTEXT,
                    EGL_LINUX_DMA_BUF_EXT,
                    null_mut(),
                    attribs.as_ptr(),
                )
            },
            ImageApi::Khr { create, .. } => {
                let int_attribs: Vec<EGLint> = attribs.iter().map(|&a| a as EGLint).collect();
                unsafe {
                    create(
                        self.display,
                        EGL_NO_CONTEXT,
                        EGL_LINUX_DMA_BUF_EXT,
                        null_mut(),
                        int_attribs.as_ptr(),
                    )
                }
            }
        };

        if image.is_null() {
            let code = unsafe { self.egl.eglGetError() };
            error!("image creation failed: 0x{code:04x}");
            return Err(io::Error::other(format!("EGL image creation failed: 0x{code:04x}")).into());
        }
        Ok(image)
    }

    /// Releases an image created by [`export_image`](EglExporter::export_image).
    pub fn destroy_image(&self, image: EGLImage) {
        match self.api {
            ImageApi::Stable { destroy, .. } => unsafe {
                destroy(self.display, image);
            },
            ImageApi::Khr { destroy, .. } => unsafe {
                destroy(self.display, image);
            },
        }
    }
}

fn resolve(egl: &egl_library, name: &str) -> Option<unsafe extern "C" fn()> {
    let name = CString::new(name).ok()?;
    unsafe { egl.eglGetProcAddress(name.as_ptr()) }
}

const PLANE_FD: [u32; MAX_PRIME_PLANES] = [
    EGL_DMA_BUF_PLANE0_FD_EXT,
    EGL_DMA_BUF_PLANE1_FD_EXT,
    EGL_DMA_BUF_PLANE2_FD_EXT,
    EGL_DMA_BUF_PLANE3_FD_EXT,
];
const PLANE_OFFSET: [u32; MAX_PRIME_PLANES] = [
    EGL_DMA_BUF_PLANE0_OFFSET_EXT,
    EGL_DMA_BUF_PLANE1_OFFSET_EXT,
    EGL_DMA_BUF_PLANE2_OFFSET_EXT,
    EGL_DMA_BUF_PLANE3_OFFSET_EXT,
];
const PLANE_PITCH: [u32; MAX_PRIME_PLANES] = [
    EGL_DMA_BUF_PLANE0_PITCH_EXT,
    EGL_DMA_BUF_PLANE1_PITCH_EXT,
    EGL_DMA_BUF_PLANE2_PITCH_EXT,
    EGL_DMA_BUF_PLANE3_PITCH_EXT,
];
const PLANE_MODIFIER_LO: [u32; MAX_PRIME_PLANES] = [
    EGL_DMA_BUF_PLANE0_MODIFIER_LO_EXT,
    EGL_DMA_BUF_PLANE1_MODIFIER_LO_EXT,
    EGL_DMA_BUF_PLANE2_MODIFIER_LO_EXT,
    EGL_DMA_BUF_PLANE3_MODIFIER_LO_EXT,
];
const PLANE_MODIFIER_HI: [u32; MAX_PRIME_PLANES] = [
    EGL_DMA_BUF_PLANE0_MODIFIER_HI_EXT,
    EGL_DMA_BUF_PLANE1_MODIFIER_HI_EXT,
    EGL_DMA_BUF_PLANE2_MODIFIER_HI_EXT,
    EGL_DMA_BUF_PLANE3_MODIFIER_HI_EXT,
];

/// Ordered DMA-BUF import attribute list for one composed layer: format,
/// size, per-plane fd/offset/pitch (with modifier words only when the
/// modifier extension is available and the object carries one), colorspace
/// and sample-range hints, and the terminating sentinel.
pub fn image_attributes(
    descriptor: &PrimeDescriptor,
    width: u32,
    height: u32,
    colorspace: Colorspace,
    full_range: bool,
    with_modifiers: bool,
) -> Vec<EGLAttrib> {
    let layer = descriptor.composed_layer();
    assert!(
        layer.planes.len() <= MAX_PRIME_PLANES,
        "composed layer has too many planes"
    );

    let mut attribs: Vec<EGLAttrib> = vec![
        EGL_LINUX_DRM_FOURCC_EXT as EGLAttrib,
        layer.format.code() as EGLAttrib,
        EGL_WIDTH as EGLAttrib,
        width as EGLAttrib,
        EGL_HEIGHT as EGLAttrib,
        height as EGLAttrib,
    ];

    for (index, plane) in layer.planes.iter().enumerate() {
        let object = descriptor.object(plane);
        attribs.extend([
            PLANE_FD[index] as EGLAttrib,
            object.fd as EGLAttrib,
            PLANE_OFFSET[index] as EGLAttrib,
            plane.offset as EGLAttrib,
            PLANE_PITCH[index] as EGLAttrib,
            plane.pitch as EGLAttrib,
        ]);
        if with_modifiers && object.has_modifier() {
            attribs.extend([
                PLANE_MODIFIER_LO[index] as EGLAttrib,
                (object.modifier & 0xFFFF_FFFF) as EGLAttrib,
                PLANE_MODIFIER_HI[index] as EGLAttrib,
                (object.modifier >> 32) as EGLAttrib,
            ]);
        }
    }

    let colorspace_hint = match colorspace {
        Colorspace::Bt601 => Some(EGL_ITU_REC601_EXT),
        Colorspace::Bt709 => Some(EGL_ITU_REC709_EXT),
        Colorspace::Bt2020 => Some(EGL_ITU_REC2020_EXT),
        Colorspace::Unknown => None,
    };
    if let Some(hint) = colorspace_hint {
        attribs.extend([EGL_YUV_COLOR_SPACE_HINT_EXT as EGLAttrib, hint as EGLAttrib]);
    }

    let range_hint = if full_range { EGL_YUV_FULL_RANGE_EXT } else { EGL_YUV_NARROW_RANGE_EXT };
    attribs.extend([EGL_SAMPLE_RANGE_HINT_EXT as EGLAttrib, range_hint as EGLAttrib]);

    attribs.push(EGL_NONE as EGLAttrib);
    attribs
}
