// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use dma_heap::{Heap, HeapKind};
use drm_sys::DRM_FORMAT_MOD_INVALID;
use serial_test::serial;
use std::error::Error;
use std::os::fd::AsRawFd;
use streamplane::device::DrmDevice;
use streamplane::frame::{
    Colorspace, PrimeDescriptor, PrimeLayer, PrimeObject, PrimePlane, Rect, VideoFrame, NV12,
};
use streamplane::present::PlaneRenderer;

const DEVICE: &str = "/dev/dri/card0";

#[test]
#[serial]
#[ignore = "device test is disabled by default (run with --include-ignored on KMS hardware)"]
fn test_bind() -> Result<(), Box<dyn Error>> {
    let device = DrmDevice::open(DEVICE)?;
    let binding = device.bind(NV12, None)?;

    println!(
        "connector {} encoder {} crtc {} plane {} mode {}x{}",
        binding.connector_id,
        binding.encoder_id,
        binding.crtc_id,
        binding.plane_id,
        binding.mode_width,
        binding.mode_height,
    );
    assert_ne!(binding.plane_id, 0);
    assert_ne!(binding.crtc_id, 0);

    Ok(())
}

/// Pushes one real frame through the full path, which is the only
/// reliable way to validate DMA-BUF import on the device.
#[test]
#[serial]
#[ignore = "device test is disabled by default (run with --include-ignored on KMS hardware)"]
fn test_probe_frame() -> Result<(), Box<dyn Error>> {
    let device = DrmDevice::open(DEVICE)?;
    let binding = device.bind(NV12, None)?;
    let mut renderer = PlaneRenderer::new(device, binding, false, None);

    let (width, height) = (1280u32, 720u32);
    let luma = (width * height) as usize;
    let heap = Heap::new(HeapKind::Cma)?;
    let fd = heap.allocate(luma + luma / 2)?;

    let frame = VideoFrame {
        width,
        height,
        colorspace: Colorspace::Bt709,
        full_range: false,
        prime: Some(PrimeDescriptor {
            objects: vec![PrimeObject {
                fd: fd.as_raw_fd(),
                size: luma + luma / 2,
                modifier: DRM_FORMAT_MOD_INVALID,
            }],
            layers: vec![PrimeLayer {
                format: NV12,
                planes: vec![
                    PrimePlane { object_index: 0, offset: 0, pitch: width },
                    PrimePlane { object_index: 0, offset: luma as u32, pitch: width },
                ],
            }],
        }),
    };

    assert!(renderer.needs_test_frame());
    renderer.test_frame(&frame)?;

    let dst = Rect {
        x: 0,
        y: 0,
        width: binding.mode_width as i32,
        height: binding.mode_height as i32,
    };
    renderer.render(&frame, dst)?;
    assert!(renderer.current_framebuffer().is_some());

    Ok(())
}
