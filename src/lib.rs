// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

//! # Streamplane Presentation Library
//!
//! This library presents hardware-decoded video frames on a display using
//! a kernel mode-setting plane, bypassing the desktop compositor. Decoded
//! frames arrive as opaque PRIME descriptors (DMA-BUF file descriptors
//! plus layout metadata) and are either committed directly to a hardware
//! overlay plane or exported as opaque GPU images for a compositing
//! renderer.
//!
//! ## Features
//!
//! - **Zero-copy plane presentation**: import decoder DMA buffers as
//!   framebuffer objects and commit them to an overlay plane with strict
//!   frame-to-frame resource hygiene.
//! - **Color negotiation**: map frame colorspace and range onto the
//!   device's plane properties, written only when they change.
//! - **HDR signaling**: static HDR metadata blob management on the
//!   connector, SMPTE ST 2084 transfer function.
//! - **GPU image export**: DMA-BUF import into single opaque EGL images
//!   for compositor sampling, with capability probing (feature `egl`).
//!
//! ## Example
//!
//! ```no_run
//! use streamplane::device::DrmDevice;
//! use streamplane::frame::{Rect, VideoFrame, NV12};
//! use streamplane::present::PlaneRenderer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let device = DrmDevice::open("/dev/dri/card0")?;
//! let binding = device.bind(NV12, None)?;
//! let mut renderer = PlaneRenderer::new(device, binding, false, None);
//!
//! # let frame: VideoFrame = unimplemented!();
//! let dst = Rect { x: 0, y: 0, width: 1920, height: 1080 };
//! renderer.render(&frame, dst)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Requirements
//!
//! - **Linux**: kernel 5.10+ with KMS universal planes and DMA-BUF
//!   support; `libdrm.so.2` at runtime.
//! - **GPU export**: an EGL display with `EGL_EXT_image_dma_buf_import`
//!   (`libEGL.so.1` at runtime).
//!
//! ## Safety
//!
//! This library uses `unsafe` code for FFI interactions with the
//! mode-setting and EGL libraries. All unsafe operations are isolated to
//! the device and export modules and wrapped with safe APIs; kernel
//! resources have one owning site and one release site reachable from
//! every control path.

pub mod backend;
pub mod device;
#[cfg(feature = "egl")]
pub mod export;
pub mod frame;
pub mod hdr;
pub mod present;
