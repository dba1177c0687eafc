// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use args::Args;
use clap::Parser;
use dma_heap::{Heap, HeapKind};
use drm_sys::DRM_FORMAT_MOD_INVALID;
use std::{
    error::Error,
    io,
    os::fd::{AsRawFd, OwnedFd},
    ptr::null_mut,
    slice::from_raw_parts_mut,
    thread,
    time::Duration,
};
use streamplane::{
    device::DrmDevice,
    frame::{Colorspace, PrimeDescriptor, PrimeLayer, PrimeObject, PrimePlane, Rect, VideoFrame, NV12},
    present::{PlaneRenderer, RenderPreference},
};
use tracing::{info, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod args;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("Streamplane presentation probe");

    let device = DrmDevice::open(&args.device)?;
    let binding = device.bind(NV12, args.connector)?;
    let preference = RenderPreference::from_env();
    let mut renderer = PlaneRenderer::new(device, binding, args.hdr10, None);

    info!("prefers GPU image export: {}", renderer.prefers_gpu_export(preference));

    let (width, height) = (args.size[0], args.size[1]);
    let luma = (width * height) as usize;
    let size = luma + luma / 2;

    let heap = Heap::new(HeapKind::Cma)?;
    let fd = heap.allocate(size)?;
    fill_nv12(&fd, width, height)?;

    let frame = VideoFrame {
        width,
        height,
        colorspace: Colorspace::Bt709,
        full_range: false,
        prime: Some(PrimeDescriptor {
            objects: vec![PrimeObject {
                fd: fd.as_raw_fd(),
                size,
                modifier: DRM_FORMAT_MOD_INVALID,
            }],
            layers: vec![PrimeLayer {
                format: NV12,
                planes: vec![
                    PrimePlane {
                        object_index: 0,
                        offset: 0,
                        pitch: width,
                    },
                    PrimePlane {
                        object_index: 0,
                        offset: luma as u32,
                        pitch: width,
                    },
                ],
            }],
        }),
    };

    let dst = Rect {
        x: 0,
        y: 0,
        width: binding.mode_width as i32,
        height: binding.mode_height as i32,
    };
    renderer.render(&frame, dst)?;
    info!("test frame committed, holding for {}s", args.hold);
    thread::sleep(Duration::from_secs(args.hold));

    if args.hdr_probe {
        renderer.set_hdr_mode(true, None);
        thread::sleep(Duration::from_secs(1));
        renderer.set_hdr_mode(false, None);
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    tracing_log::LogTracer::init()?;
    let level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let registry = tracing_subscriber::registry()
        .with(level)
        .with(tracing_subscriber::fmt::layer().with_target(false));
    if args.journald {
        registry.with(tracing_journald::layer()?).init();
    } else {
        registry.init();
    }
    Ok(())
}

/// Fill the test buffer with a horizontal luma ramp over neutral chroma.
fn fill_nv12(fd: &OwnedFd, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
    let width = width as usize;
    let luma = width * height as usize;
    let size = luma + luma / 2;

    let mapped = unsafe {
        libc::mmap(
            null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd.as_raw_fd(),
            0,
        )
    };
    if mapped == libc::MAP_FAILED {
        return Err(Box::new(io::Error::last_os_error()));
    }

    let pixels = unsafe { from_raw_parts_mut(mapped.cast::<u8>(), size) };
    for row in pixels[..luma].chunks_exact_mut(width) {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = (16 + (x * 219) / width) as u8;
        }
    }
    pixels[luma..].fill(128);

    if unsafe { libc::munmap(mapped, size) } != 0 {
        warn!("unmap failed!");
    }
    Ok(())
}
