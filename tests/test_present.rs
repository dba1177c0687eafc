// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use drm_sys::DRM_FORMAT_MOD_INVALID;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::io;
use std::os::fd::RawFd;
use std::rc::Rc;
use streamplane::backend::FrameBackend;
use streamplane::device::{EnumProperty, ModeSetting, ObjectType, PlaneBinding};
use streamplane::frame::{
    Colorspace, FourCC, PrimeDescriptor, PrimeLayer, PrimeObject, PrimePlane, Rect, VideoFrame, NV12,
};
use streamplane::hdr::{self, HdrStaticMetadata};
use streamplane::present::{
    color_encoding_name, color_range_name, prefer_gpu_image, PlaneRenderer, RenderPreference,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Import(RawFd),
    AddFb { fb_id: u32, with_modifiers: bool },
    RmFb(u32),
    Commit(u32),
    SetProp { object_id: u32, property_id: u32, value: u64 },
    CreateBlob(u32),
    DestroyBlob(u32),
}

#[derive(Default)]
struct FakeDevice {
    ops: Rc<RefCell<Vec<Op>>>,
    plane_props: Vec<EnumProperty>,
    connector_props: Vec<EnumProperty>,
    fail_import: Cell<bool>,
    fail_add_fb: Cell<bool>,
    fail_commit: Cell<bool>,
    fail_blob: Cell<bool>,
    next_fb: Cell<u32>,
    next_blob: Cell<u32>,
}

impl FakeDevice {
    fn with_color_props() -> Self {
        FakeDevice {
            plane_props: vec![
                EnumProperty {
                    id: 1,
                    name: "COLOR_ENCODING".to_string(),
                    enums: vec![
                        ("ITU-R BT.601 YCbCr".to_string(), 0),
                        ("ITU-R BT.709 YCbCr".to_string(), 1),
                        ("ITU-R BT.2020 YCbCr".to_string(), 2),
                    ],
                },
                EnumProperty {
                    id: 2,
                    name: "COLOR_RANGE".to_string(),
                    enums: vec![
                        ("YCbCr limited range".to_string(), 0),
                        ("YCbCr full range".to_string(), 1),
                    ],
                },
            ],
            ..Default::default()
        }
    }

    fn with_hdr_prop() -> Self {
        FakeDevice {
            connector_props: vec![EnumProperty {
                id: 3,
                name: "HDR_OUTPUT_METADATA".to_string(),
                enums: vec![],
            }],
            ..Default::default()
        }
    }

    fn record(&self, op: Op) {
        self.ops.borrow_mut().push(op);
    }
}

impl ModeSetting for FakeDevice {
    fn prime_to_handle(&self, prime_fd: RawFd) -> io::Result<u32> {
        if self.fail_import.get() {
            return Err(io::Error::other("import refused"));
        }
        self.record(Op::Import(prime_fd));
        Ok(prime_fd as u32 + 1000)
    }

    fn add_framebuffer(
        &self,
        _width: u32,
        _height: u32,
        _format: FourCC,
        _handles: &[u32; 4],
        _pitches: &[u32; 4],
        _offsets: &[u32; 4],
        modifiers: Option<&[u64; 4]>,
    ) -> io::Result<u32> {
        if self.fail_add_fb.get() {
            return Err(io::Error::other("framebuffer refused"));
        }
        let fb_id = self.next_fb.get() + 1;
        self.next_fb.set(fb_id);
        self.record(Op::AddFb {
            fb_id,
            with_modifiers: modifiers.is_some(),
        });
        Ok(fb_id)
    }

    fn remove_framebuffer(&self, fb_id: u32) {
        self.record(Op::RmFb(fb_id));
    }

    fn commit_plane(
        &self,
        _plane_id: u32,
        _crtc_id: u32,
        fb_id: u32,
        _dst: Rect,
        _src_width: u32,
        _src_height: u32,
    ) -> io::Result<()> {
        if self.fail_commit.get() {
            return Err(io::Error::other("commit refused"));
        }
        self.record(Op::Commit(fb_id));
        Ok(())
    }

    fn find_enum_property(
        &self,
        _object_id: u32,
        object_type: ObjectType,
        name: &str,
    ) -> Option<EnumProperty> {
        let props = match object_type {
            ObjectType::Plane => &self.plane_props,
            ObjectType::Connector => &self.connector_props,
            ObjectType::Crtc => return None,
        };
        props.iter().find(|prop| prop.name == name).cloned()
    }

    fn set_property(
        &self,
        object_id: u32,
        _object_type: ObjectType,
        property_id: u32,
        value: u64,
    ) -> io::Result<()> {
        self.record(Op::SetProp {
            object_id,
            property_id,
            value,
        });
        Ok(())
    }

    fn create_property_blob(&self, data: &[u8]) -> io::Result<u32> {
        assert!(!data.is_empty());
        if self.fail_blob.get() {
            return Err(io::Error::other("blob refused"));
        }
        let blob_id = self.next_blob.get() + 101;
        self.next_blob.set(blob_id);
        self.record(Op::CreateBlob(blob_id));
        Ok(blob_id)
    }

    fn destroy_property_blob(&self, blob_id: u32) {
        self.record(Op::DestroyBlob(blob_id));
    }
}

fn binding() -> PlaneBinding {
    PlaneBinding {
        connector_id: 30,
        encoder_id: 31,
        crtc_id: 32,
        plane_id: 33,
        mode_width: 1920,
        mode_height: 1080,
    }
}

fn dst() -> Rect {
    Rect {
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
    }
}

fn nv12_descriptor(planes: usize, modifier: u64) -> PrimeDescriptor {
    PrimeDescriptor {
        objects: (0..planes)
            .map(|index| PrimeObject {
                fd: 40 + index as RawFd,
                size: 0x10_0000,
                modifier,
            })
            .collect(),
        layers: vec![PrimeLayer {
            format: NV12,
            planes: (0..planes)
                .map(|index| PrimePlane {
                    object_index: index,
                    offset: 0,
                    pitch: 1920,
                })
                .collect(),
        }],
    }
}

fn nv12_frame(colorspace: Colorspace, full_range: bool) -> VideoFrame {
    VideoFrame {
        width: 1920,
        height: 1080,
        colorspace,
        full_range,
        prime: Some(nv12_descriptor(2, DRM_FORMAT_MOD_INVALID)),
    }
}

fn renderer(device: FakeDevice) -> (PlaneRenderer<FakeDevice>, Rc<RefCell<Vec<Op>>>) {
    let ops = device.ops.clone();
    (PlaneRenderer::new(device, binding(), false, None), ops)
}

fn position(ops: &[Op], wanted: &Op) -> usize {
    ops.iter()
        .position(|op| op == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not recorded in {ops:?}"))
}

#[test]
fn render_keeps_exactly_one_framebuffer_current() -> Result<(), Box<dyn Error>> {
    for planes in 1..=4 {
        let (mut renderer, ops) = renderer(FakeDevice::default());
        let mut frame = nv12_frame(Colorspace::Bt709, false);
        frame.prime = Some(nv12_descriptor(planes, DRM_FORMAT_MOD_INVALID));

        renderer.render(&frame, dst())?;
        assert_eq!(renderer.current_framebuffer(), Some(1));

        renderer.render(&frame, dst())?;
        assert_eq!(renderer.current_framebuffer(), Some(2));

        // The superseded framebuffer goes away only after the new one is
        // committed, and it is the only one destroyed.
        let ops = ops.borrow();
        let removed: Vec<_> = ops.iter().filter(|op| matches!(op, Op::RmFb(_))).collect();
        assert_eq!(removed, vec![&Op::RmFb(1)]);
        assert!(position(&ops, &Op::RmFb(1)) > position(&ops, &Op::Commit(2)));
        assert_eq!(
            ops.iter().filter(|op| matches!(op, Op::Import(_))).count(),
            planes * 2
        );
    }
    Ok(())
}

#[test]
fn framebuffer_creation_failure_leaves_prior_frame() -> Result<(), Box<dyn Error>> {
    let (mut renderer, ops) = renderer(FakeDevice::default());
    let frame = nv12_frame(Colorspace::Bt709, false);

    renderer.render(&frame, dst())?;
    renderer.device().fail_add_fb.set(true);

    assert!(renderer.render(&frame, dst()).is_err());
    assert_eq!(renderer.current_framebuffer(), Some(1));

    let ops = ops.borrow();
    assert_eq!(ops.iter().filter(|op| matches!(op, Op::Commit(_))).count(), 1);
    assert!(!ops.contains(&Op::RmFb(1)));
    Ok(())
}

#[test]
fn commit_failure_destroys_uncommitted_framebuffer() -> Result<(), Box<dyn Error>> {
    let (mut renderer, ops) = renderer(FakeDevice::default());
    let frame = nv12_frame(Colorspace::Bt709, false);

    renderer.render(&frame, dst())?;
    renderer.device().fail_commit.set(true);

    assert!(renderer.render(&frame, dst()).is_err());
    assert_eq!(renderer.current_framebuffer(), Some(1));

    let ops = ops.borrow();
    assert!(ops.contains(&Op::AddFb { fb_id: 2, with_modifiers: false }));
    assert!(ops.contains(&Op::RmFb(2)));
    assert!(!ops.contains(&Op::RmFb(1)));
    Ok(())
}

#[test]
fn modifiers_passed_only_when_an_object_carries_one() -> Result<(), Box<dyn Error>> {
    let (mut renderer, ops) = renderer(FakeDevice::default());

    let mut frame = nv12_frame(Colorspace::Bt709, false);
    renderer.render(&frame, dst())?;

    frame.prime = Some(nv12_descriptor(2, 0x0100_0000_0000_0002));
    renderer.render(&frame, dst())?;

    let ops = ops.borrow();
    assert!(ops.contains(&Op::AddFb { fb_id: 1, with_modifiers: false }));
    assert!(ops.contains(&Op::AddFb { fb_id: 2, with_modifiers: true }));
    Ok(())
}

#[test]
fn color_properties_written_once_and_cached() -> Result<(), Box<dyn Error>> {
    let (mut renderer, ops) = renderer(FakeDevice::with_color_props());
    let frame = nv12_frame(Colorspace::Bt709, false);

    renderer.render(&frame, dst())?;
    renderer.render(&frame, dst())?;

    let ops = ops.borrow();
    let writes: Vec<_> = ops.iter().filter(|op| matches!(op, Op::SetProp { .. })).collect();
    assert_eq!(
        writes,
        vec![
            // Limited range, then BT.709 encoding, on the bound plane.
            &Op::SetProp { object_id: 33, property_id: 2, value: 0 },
            &Op::SetProp { object_id: 33, property_id: 1, value: 1 },
        ]
    );
    Ok(())
}

#[test]
fn color_range_reapplied_when_colorspace_changes() -> Result<(), Box<dyn Error>> {
    let (mut renderer, ops) = renderer(FakeDevice::with_color_props());

    renderer.render(&nv12_frame(Colorspace::Bt709, false), dst())?;
    // Same range, new colorspace: the range write must repeat anyway.
    renderer.render(&nv12_frame(Colorspace::Bt2020, false), dst())?;
    renderer.render(&nv12_frame(Colorspace::Bt2020, false), dst())?;

    let ops = ops.borrow();
    let range_writes = ops
        .iter()
        .filter(|op| matches!(op, Op::SetProp { property_id: 2, .. }))
        .count();
    let encoding_writes = ops
        .iter()
        .filter(|op| matches!(op, Op::SetProp { property_id: 1, .. }))
        .count();
    assert_eq!(range_writes, 2);
    assert_eq!(encoding_writes, 2);
    Ok(())
}

#[test]
fn unknown_colorspace_skips_encoding_negotiation() -> Result<(), Box<dyn Error>> {
    let (mut renderer, ops) = renderer(FakeDevice::with_color_props());

    renderer.render(&nv12_frame(Colorspace::Unknown, true), dst())?;

    let ops = ops.borrow();
    assert!(ops.contains(&Op::SetProp { object_id: 33, property_id: 2, value: 1 }));
    assert!(!ops.iter().any(|op| matches!(op, Op::SetProp { property_id: 1, .. })));
    Ok(())
}

#[test]
fn missing_color_properties_never_write() -> Result<(), Box<dyn Error>> {
    let (mut renderer, ops) = renderer(FakeDevice::default());

    renderer.render(&nv12_frame(Colorspace::Bt709, false), dst())?;

    assert!(!ops.borrow().iter().any(|op| matches!(op, Op::SetProp { .. })));
    Ok(())
}

#[test]
fn hdr_enable_without_property_is_a_noop() {
    let (mut renderer, ops) = renderer(FakeDevice::default());

    renderer.set_hdr_mode(true, None);

    assert!(ops.borrow().is_empty());
}

#[test]
fn hdr_blob_destroyed_before_replacement() {
    let (mut renderer, ops) = renderer(FakeDevice::with_hdr_prop());

    renderer.set_hdr_mode(true, Some(&HdrStaticMetadata::default()));
    renderer.set_hdr_mode(true, Some(&HdrStaticMetadata::default()));

    let recorded = ops.borrow().clone();
    assert_eq!(
        recorded,
        vec![
            Op::CreateBlob(101),
            Op::SetProp { object_id: 30, property_id: 3, value: 101 },
            Op::DestroyBlob(101),
            Op::CreateBlob(202),
            Op::SetProp { object_id: 30, property_id: 3, value: 202 },
        ]
    );
}

#[test]
fn hdr_disable_writes_zero_even_without_blob() {
    let (mut renderer, ops) = renderer(FakeDevice::with_hdr_prop());

    renderer.set_hdr_mode(false, None);

    let recorded = ops.borrow().clone();
    assert_eq!(recorded, vec![Op::SetProp { object_id: 30, property_id: 3, value: 0 }]);
}

#[test]
fn hdr_blob_creation_failure_is_nonfatal() {
    let (mut renderer, ops) = renderer(FakeDevice::with_hdr_prop());
    renderer.device().fail_blob.set(true);

    renderer.set_hdr_mode(true, None);

    // No metadata attached, but the mode transition is still attempted.
    let recorded = ops.borrow().clone();
    assert_eq!(recorded, vec![Op::SetProp { object_id: 30, property_id: 3, value: 0 }]);
}

#[test]
fn teardown_forces_hdr_off_and_releases_framebuffer() -> Result<(), Box<dyn Error>> {
    let (mut renderer, ops) = renderer(FakeDevice::with_hdr_prop());

    renderer.render(&nv12_frame(Colorspace::Bt709, false), dst())?;
    renderer.set_hdr_mode(true, None);
    drop(renderer);

    let ops = ops.borrow();
    let disable = Op::SetProp { object_id: 30, property_id: 3, value: 0 };
    assert!(position(&ops, &Op::DestroyBlob(101)) < position(&ops, &disable));
    assert!(position(&ops, &disable) < position(&ops, &Op::RmFb(1)));
    Ok(())
}

struct CountingBackend {
    descriptor: PrimeDescriptor,
    maps: Rc<Cell<usize>>,
    unmaps: Rc<Cell<usize>>,
    fail_map: bool,
}

impl CountingBackend {
    fn new(fail_map: bool) -> (Self, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let maps = Rc::new(Cell::new(0));
        let unmaps = Rc::new(Cell::new(0));
        let backend = CountingBackend {
            descriptor: nv12_descriptor(2, DRM_FORMAT_MOD_INVALID),
            maps: maps.clone(),
            unmaps: unmaps.clone(),
            fail_map,
        };
        (backend, maps, unmaps)
    }
}

impl FrameBackend for CountingBackend {
    fn map_frame(&self, _frame: &VideoFrame) -> Result<PrimeDescriptor, Box<dyn Error>> {
        if self.fail_map {
            return Err("mapping refused".into());
        }
        self.maps.set(self.maps.get() + 1);
        Ok(self.descriptor.clone())
    }

    fn unmap_frame(&self, _descriptor: &PrimeDescriptor) {
        self.unmaps.set(self.unmaps.get() + 1);
    }

    fn can_export_prime(&self) -> bool {
        true
    }

    fn preferred_format(&self) -> FourCC {
        NV12
    }
}

fn backend_frame() -> VideoFrame {
    VideoFrame {
        width: 1920,
        height: 1080,
        colorspace: Colorspace::Bt709,
        full_range: false,
        prime: None,
    }
}

#[test]
fn backend_mapping_failure_skips_frame_untouched() {
    let device = FakeDevice::default();
    let ops = device.ops.clone();
    let (backend, _, _) = CountingBackend::new(true);
    let mut renderer = PlaneRenderer::new(device, binding(), false, Some(Box::new(backend)));

    assert!(renderer.render(&backend_frame(), dst()).is_err());
    assert_eq!(renderer.current_framebuffer(), None);
    assert!(ops.borrow().is_empty());
}

#[test]
fn backend_unmapped_exactly_once_per_successful_map() -> Result<(), Box<dyn Error>> {
    let device = FakeDevice::default();
    let (backend, maps, unmaps) = CountingBackend::new(false);
    let mut renderer = PlaneRenderer::new(device, binding(), false, Some(Box::new(backend)));

    renderer.render(&backend_frame(), dst())?;
    assert_eq!((maps.get(), unmaps.get()), (1, 1));

    // The mapping is released even when buffer import aborts the frame.
    renderer.device().fail_import.set(true);
    assert!(renderer.render(&backend_frame(), dst()).is_err());
    assert_eq!((maps.get(), unmaps.get()), (2, 2));

    renderer.device().fail_import.set(false);
    renderer.test_frame(&backend_frame())?;
    assert_eq!((maps.get(), unmaps.get()), (3, 3));
    Ok(())
}

#[test]
fn color_enum_names_match_device_strings() {
    assert_eq!(color_encoding_name(Colorspace::Bt601), Some("ITU-R BT.601 YCbCr"));
    assert_eq!(color_encoding_name(Colorspace::Bt709), Some("ITU-R BT.709 YCbCr"));
    assert_eq!(color_encoding_name(Colorspace::Bt2020), Some("ITU-R BT.2020 YCbCr"));
    assert_eq!(color_encoding_name(Colorspace::Unknown), None);
    assert_eq!(color_range_name(true), "YCbCr full range");
    assert_eq!(color_range_name(false), "YCbCr limited range");
}

#[test]
fn gpu_image_preference_resolution() {
    assert!(!prefer_gpu_image(RenderPreference::ForceDirect, true, true));
    assert!(prefer_gpu_image(RenderPreference::ForceGpuImage, true, true));
    // Direct rendering wins only for HDR content it alone can present.
    assert!(!prefer_gpu_image(RenderPreference::Auto, true, true));
    assert!(prefer_gpu_image(RenderPreference::Auto, true, false));
    assert!(prefer_gpu_image(RenderPreference::Auto, false, true));
}

#[test]
fn hdr_metadata_payload_population() {
    let zeroed = hdr::output_metadata(None);
    assert_eq!(zeroed.metadata_type, 0);
    assert_eq!(zeroed.hdmi_metadata_type1.eotf, 2);
    assert_eq!(zeroed.hdmi_metadata_type1.max_cll, 0);
    assert_eq!(zeroed.hdmi_metadata_type1.white_point.x, 0);

    let source = HdrStaticMetadata {
        display_primaries: [(34000, 16000), (13250, 34500), (7500, 3000)],
        white_point: (15635, 16450),
        max_display_mastering_luminance: 1000,
        min_display_mastering_luminance: 50,
        max_content_light_level: 1000,
        max_frame_average_light_level: 400,
    };
    let populated = hdr::output_metadata(Some(&source));
    assert_eq!(populated.hdmi_metadata_type1.display_primaries[1].y, 34500);
    assert_eq!(populated.hdmi_metadata_type1.white_point.y, 16450);
    assert_eq!(populated.hdmi_metadata_type1.max_display_mastering_luminance, 1000);
    assert_eq!(populated.hdmi_metadata_type1.max_fall, 400);

    let bytes = hdr::metadata_bytes(&populated);
    assert_eq!(bytes.len(), std::mem::size_of::<drm_sys::hdr_output_metadata>());
}
