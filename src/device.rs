// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use crate::frame::{FourCC, Rect};
use drm_sys::{
    drm as drm_library, drmModeConnection_DRM_MODE_CONNECTED, DRM_CLIENT_CAP_UNIVERSAL_PLANES,
    DRM_MODE_FB_MODIFIERS, DRM_MODE_OBJECT_CONNECTOR, DRM_MODE_OBJECT_CRTC, DRM_MODE_OBJECT_PLANE,
    DRM_PLANE_TYPE_OVERLAY, DRM_PROP_NAME_LEN,
};
use libc::{c_char, c_int};
use std::{
    error::Error,
    fs::OpenOptions,
    io,
    os::fd::{AsRawFd, OwnedFd, RawFd},
    ptr::null,
};
use tracing::{debug, info, warn};

/// Kernel object class a property or property write is addressed to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObjectType {
    Connector,
    Crtc,
    Plane,
}

impl ObjectType {
    pub fn raw(self) -> u32 {
        match self {
            ObjectType::Connector => DRM_MODE_OBJECT_CONNECTOR,
            ObjectType::Crtc => DRM_MODE_OBJECT_CRTC,
            ObjectType::Plane => DRM_MODE_OBJECT_PLANE,
        }
    }
}

/// Snapshot of a device-reported enum-valued property: name, id, and the
/// ordered (name, value) pairs the device accepts for it.
#[derive(Clone, Debug)]
pub struct EnumProperty {
    pub id: u32,
    pub name: String,
    pub enums: Vec<(String, u64)>,
}

impl EnumProperty {
    /// Value for an enum entry, matched by exact name.
    pub fn value_for(&self, name: &str) -> Option<u64> {
        self.enums
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| *value)
    }
}

/// Identifiers of the display path a renderer presents through.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaneBinding {
    pub connector_id: u32,
    pub encoder_id: u32,
    pub crtc_id: u32,
    pub plane_id: u32,
    /// Active mode size of the bound CRTC, useful as a full-screen
    /// destination rectangle.
    pub mode_width: u32,
    pub mode_height: u32,
}

/// The mode-setting control surface the presenter drives.
///
/// One implementation talks to the real device; tests substitute a
/// recording fake to exercise the kernel-resource lifecycle invariants.
pub trait ModeSetting {
    /// Import a PRIME (DMA-BUF) file descriptor into a device-local
    /// buffer handle.
    fn prime_to_handle(&self, prime_fd: RawFd) -> io::Result<u32>;

    /// Register a framebuffer object over previously imported handles.
    /// `modifiers` must be `Some` only when at least one plane carries a
    /// valid format modifier.
    #[allow(clippy::too_many_arguments)]
    fn add_framebuffer(
        &self,
        width: u32,
        height: u32,
        format: FourCC,
        handles: &[u32; 4],
        pitches: &[u32; 4],
        offsets: &[u32; 4],
        modifiers: Option<&[u64; 4]>,
    ) -> io::Result<u32>;

    /// Destroy a framebuffer object. Failures are logged, not reported;
    /// this runs on rollback and teardown paths.
    fn remove_framebuffer(&self, fb_id: u32);

    /// Commit a framebuffer to the plane at `dst`, source-cropped to
    /// `src_width` x `src_height`.
    fn commit_plane(
        &self,
        plane_id: u32,
        crtc_id: u32,
        fb_id: u32,
        dst: Rect,
        src_width: u32,
        src_height: u32,
    ) -> io::Result<()>;

    /// Look up a property on an object by name. `None` means the device
    /// does not expose it; this permanently disables the corresponding
    /// negotiation and is never an error.
    fn find_enum_property(&self, object_id: u32, object_type: ObjectType, name: &str)
        -> Option<EnumProperty>;

    fn set_property(
        &self,
        object_id: u32,
        object_type: ObjectType,
        property_id: u32,
        value: u64,
    ) -> io::Result<()>;

    fn create_property_blob(&self, data: &[u8]) -> io::Result<u32>;

    /// Destroy a property blob. Failures are logged, not reported.
    fn destroy_property_blob(&self, blob_id: u32);
}

enum DeviceHandle {
    /// Opened by us, closed on drop.
    Owned(OwnedFd),
    /// Owned by a windowing layer; never closed here.
    Borrowed(RawFd),
}

/// An open mode-setting device node plus the loaded control library.
///
/// The handle is either owned (opened from a device path, closed at drop)
/// or borrowed from a windowing layer that retains ownership.
pub struct DrmDevice {
    lib: drm_library,
    handle: DeviceHandle,
}

impl DrmDevice {
    /// Opens the device node at `path` and takes ownership of the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the control library cannot be loaded
    /// (`libdrm.so.2`) or the node cannot be opened read-write. Callers
    /// should treat failure as "this presentation path is unavailable"
    /// and fall back, not as a hard fault.
    pub fn open(path: &str) -> Result<Self, Box<dyn Error>> {
        let lib = unsafe { drm_library::new("libdrm.so.2") }?;
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        debug!("opened display device {path}");
        Ok(Self {
            lib,
            handle: DeviceHandle::Owned(file.into()),
        })
    }

    /// Wraps a device handle owned by the windowing layer. The handle is
    /// never closed by this instance.
    pub fn from_borrowed(fd: RawFd) -> Result<Self, Box<dyn Error>> {
        let lib = unsafe { drm_library::new("libdrm.so.2") }?;
        Ok(Self {
            lib,
            handle: DeviceHandle::Borrowed(fd),
        })
    }

    pub fn fd(&self) -> RawFd {
        match &self.handle {
            DeviceHandle::Owned(fd) => fd.as_raw_fd(),
            DeviceHandle::Borrowed(fd) => *fd,
        }
    }

    /// Discovers the presentation path: a connected connector (or the one
    /// given as `connector_hint`), its encoder and CRTC, and a plane on
    /// that CRTC which scans out `format`.
    ///
    /// # Errors
    ///
    /// Any missing link in the chain makes the direct presentation path
    /// unavailable for this session; the error reports which one.
    pub fn bind(&self, format: FourCC, connector_hint: Option<u32>) -> Result<PlaneBinding, Box<dyn Error>> {
        let fd = self.fd();

        if unsafe { self.lib.drmSetClientCap(fd, DRM_CLIENT_CAP_UNIVERSAL_PLANES, 1) } != 0 {
            debug!("universal planes client cap rejected, plane list may be incomplete");
        }

        let (connectors, crtcs) = self.mode_resources()?;

        let connector = self
            .select_connector(&connectors, connector_hint)
            .ok_or_else(|| io::Error::other("no connected connector found"))?;

        let (encoder_id, crtc_id) = self
            .select_crtc(&connector, &crtcs)
            .ok_or_else(|| io::Error::other("no CRTC reachable from connector"))?;

        let crtc_index = crtcs
            .iter()
            .position(|&id| id == crtc_id)
            .ok_or_else(|| io::Error::other("CRTC missing from resource list"))?;

        let (mode_width, mode_height) = self.crtc_mode_size(crtc_id).unwrap_or(connector.mode_size);

        let plane_id = self
            .select_plane(crtc_index, format)
            .ok_or_else(|| io::Error::other(format!("no plane scans out {format} on CRTC {crtc_id}")))?;

        info!(
            connector = connector.id,
            encoder = encoder_id,
            crtc = crtc_id,
            plane = plane_id,
            "bound display plane for {format} at {mode_width}x{mode_height}"
        );

        Ok(PlaneBinding {
            connector_id: connector.id,
            encoder_id,
            crtc_id,
            plane_id,
            mode_width,
            mode_height,
        })
    }

    fn mode_resources(&self) -> Result<(Vec<u32>, Vec<u32>), Box<dyn Error>> {
        let res = unsafe { self.lib.drmModeGetResources(self.fd()) };
        if res.is_null() {
            return Err(Box::new(io::Error::other("no mode-setting resources on device")));
        }
        let connectors = unsafe { read_ids((*res).connectors, (*res).count_connectors) };
        let crtcs = unsafe { read_ids((*res).crtcs, (*res).count_crtcs) };
        unsafe { self.lib.drmModeFreeResources(res) };
        Ok((connectors, crtcs))
    }

    fn select_connector(&self, connectors: &[u32], hint: Option<u32>) -> Option<ConnectorInfo> {
        let fd = self.fd();
        for &id in connectors {
            let conn = unsafe { self.lib.drmModeGetConnector(fd, id) };
            if conn.is_null() {
                continue;
            }
            let snapshot = unsafe {
                ConnectorInfo {
                    id: (*conn).connector_id,
                    encoder_id: (*conn).encoder_id,
                    connected: (*conn).connection == drmModeConnection_DRM_MODE_CONNECTED,
                    encoders: read_ids((*conn).encoders, (*conn).count_encoders),
                    mode_size: if (*conn).count_modes > 0 && !(*conn).modes.is_null() {
                        ((*(*conn).modes).hdisplay as u32, (*(*conn).modes).vdisplay as u32)
                    } else {
                        (0, 0)
                    },
                }
            };
            unsafe { self.lib.drmModeFreeConnector(conn) };

            match hint {
                Some(wanted) if snapshot.id == wanted => return Some(snapshot),
                Some(_) => continue,
                None if snapshot.connected => return Some(snapshot),
                None => continue,
            }
        }
        None
    }

    /// Resolve the encoder and CRTC currently driving the connector,
    /// falling back to the first CRTC any of its encoders can reach.
    fn select_crtc(&self, connector: &ConnectorInfo, crtcs: &[u32]) -> Option<(u32, u32)> {
        let fd = self.fd();

        if connector.encoder_id != 0 {
            let enc = unsafe { self.lib.drmModeGetEncoder(fd, connector.encoder_id) };
            if !enc.is_null() {
                let crtc_id = unsafe { (*enc).crtc_id };
                unsafe { self.lib.drmModeFreeEncoder(enc) };
                if crtc_id != 0 {
                    return Some((connector.encoder_id, crtc_id));
                }
            }
        }

        for &encoder_id in &connector.encoders {
            let enc = unsafe { self.lib.drmModeGetEncoder(fd, encoder_id) };
            if enc.is_null() {
                continue;
            }
            let (active_crtc, possible) = unsafe { ((*enc).crtc_id, (*enc).possible_crtcs) };
            unsafe { self.lib.drmModeFreeEncoder(enc) };
            if active_crtc != 0 {
                return Some((encoder_id, active_crtc));
            }
            for (index, &crtc_id) in crtcs.iter().enumerate() {
                if possible & (1 << index) != 0 {
                    return Some((encoder_id, crtc_id));
                }
            }
        }
        None
    }

    fn crtc_mode_size(&self, crtc_id: u32) -> Option<(u32, u32)> {
        let crtc = unsafe { self.lib.drmModeGetCrtc(self.fd(), crtc_id) };
        if crtc.is_null() {
            return None;
        }
        let size = unsafe { ((*crtc).width, (*crtc).height) };
        unsafe { self.lib.drmModeFreeCrtc(crtc) };
        (size.0 != 0 && size.1 != 0).then_some(size)
    }

    /// Pick a plane on `crtc_index` that scans out `format`, preferring a
    /// dedicated overlay over the primary plane.
    fn select_plane(&self, crtc_index: usize, format: FourCC) -> Option<u32> {
        let fd = self.fd();

        let pres = unsafe { self.lib.drmModeGetPlaneResources(fd) };
        if pres.is_null() {
            return None;
        }
        let plane_ids = unsafe { read_ids((*pres).planes, (*pres).count_planes as c_int) };
        unsafe { self.lib.drmModeFreePlaneResources(pres) };

        let mut fallback = None;
        for id in plane_ids {
            let plane = unsafe { self.lib.drmModeGetPlane(fd, id) };
            if plane.is_null() {
                continue;
            }
            let (possible_crtcs, formats) = unsafe {
                ((*plane).possible_crtcs, read_ids((*plane).formats, (*plane).count_formats as c_int))
            };
            unsafe { self.lib.drmModeFreePlane(plane) };

            if possible_crtcs & (1 << crtc_index) == 0 || !formats.contains(&format.code()) {
                continue;
            }
            if self.object_property_value(id, ObjectType::Plane, "type") == Some(DRM_PLANE_TYPE_OVERLAY) {
                return Some(id);
            }
            fallback.get_or_insert(id);
        }
        fallback
    }

    /// Current value of a named property on an object, if the object
    /// exposes one.
    pub fn object_property_value(&self, object_id: u32, object_type: ObjectType, name: &str) -> Option<u64> {
        let fd = self.fd();
        let props = unsafe { self.lib.drmModeObjectGetProperties(fd, object_id, object_type.raw()) };
        if props.is_null() {
            return None;
        }

        let mut found = None;
        let count = unsafe { (*props).count_props } as usize;
        for index in 0..count {
            let prop_id = unsafe { *(*props).props.add(index) };
            let prop = unsafe { self.lib.drmModeGetProperty(fd, prop_id) };
            if prop.is_null() {
                continue;
            }
            let matches = unsafe { prop_name(&(*prop).name) } == name;
            unsafe { self.lib.drmModeFreeProperty(prop) };
            if matches {
                found = Some(unsafe { *(*props).prop_values.add(index) });
                break;
            }
        }
        unsafe { self.lib.drmModeFreeObjectProperties(props) };
        found
    }
}

impl ModeSetting for DrmDevice {
    fn prime_to_handle(&self, prime_fd: RawFd) -> io::Result<u32> {
        let mut handle = 0;
        if unsafe { self.lib.drmPrimeFDToHandle(self.fd(), prime_fd, &mut handle) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(handle)
    }

    fn add_framebuffer(
        &self,
        width: u32,
        height: u32,
        format: FourCC,
        handles: &[u32; 4],
        pitches: &[u32; 4],
        offsets: &[u32; 4],
        modifiers: Option<&[u64; 4]>,
    ) -> io::Result<u32> {
        let flags = if modifiers.is_some() { DRM_MODE_FB_MODIFIERS } else { 0 };
        let mut fb_id = 0;
        // Passing a modifier array without DRM_MODE_FB_MODIFIERS is an error.
        let err = unsafe {
            self.lib.drmModeAddFB2WithModifiers(
                self.fd(),
                width,
                height,
                format.code(),
                handles.as_ptr(),
                pitches.as_ptr(),
                offsets.as_ptr(),
                modifiers.map_or(null(), |m| m.as_ptr()),
                &mut fb_id,
                flags,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(fb_id)
    }

    fn remove_framebuffer(&self, fb_id: u32) {
        if unsafe { self.lib.drmModeRmFB(self.fd(), fb_id) } < 0 {
            warn!("failed to remove framebuffer {fb_id}: {}", io::Error::last_os_error());
        }
    }

    fn commit_plane(
        &self,
        plane_id: u32,
        crtc_id: u32,
        fb_id: u32,
        dst: Rect,
        src_width: u32,
        src_height: u32,
    ) -> io::Result<()> {
        // Source coordinates are 16.16 fixed point.
        let err = unsafe {
            self.lib.drmModeSetPlane(
                self.fd(),
                plane_id,
                crtc_id,
                fb_id,
                0,
                dst.x,
                dst.y,
                dst.width as u32,
                dst.height as u32,
                0,
                0,
                src_width << 16,
                src_height << 16,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn find_enum_property(
        &self,
        object_id: u32,
        object_type: ObjectType,
        name: &str,
    ) -> Option<EnumProperty> {
        let fd = self.fd();
        let props = unsafe { self.lib.drmModeObjectGetProperties(fd, object_id, object_type.raw()) };
        if props.is_null() {
            return None;
        }

        let mut found = None;
        let count = unsafe { (*props).count_props } as usize;
        for index in 0..count {
            let prop_id = unsafe { *(*props).props.add(index) };
            let prop = unsafe { self.lib.drmModeGetProperty(fd, prop_id) };
            if prop.is_null() {
                continue;
            }
            let prop_matches = unsafe { prop_name(&(*prop).name) } == name;
            if prop_matches {
                let count_enums = unsafe { (*prop).count_enums } as usize;
                let mut enums = Vec::with_capacity(count_enums);
                for enum_index in 0..count_enums {
                    let entry = unsafe { &*(*prop).enums.add(enum_index) };
                    enums.push((prop_name(&entry.name), entry.value));
                }
                found = Some(EnumProperty {
                    id: unsafe { (*prop).prop_id },
                    name: name.to_string(),
                    enums,
                });
            }
            unsafe { self.lib.drmModeFreeProperty(prop) };
            if found.is_some() {
                break;
            }
        }
        unsafe { self.lib.drmModeFreeObjectProperties(props) };
        found
    }

    fn set_property(
        &self,
        object_id: u32,
        object_type: ObjectType,
        property_id: u32,
        value: u64,
    ) -> io::Result<()> {
        let err = unsafe {
            self.lib
                .drmModeObjectSetProperty(self.fd(), object_id, object_type.raw(), property_id, value)
        };
        if err != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn create_property_blob(&self, data: &[u8]) -> io::Result<u32> {
        let mut blob_id = 0;
        let err = unsafe {
            self.lib.drmModeCreatePropertyBlob(
                self.fd(),
                data.as_ptr().cast(),
                data.len(),
                &mut blob_id,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(blob_id)
    }

    fn destroy_property_blob(&self, blob_id: u32) {
        if unsafe { self.lib.drmModeDestroyPropertyBlob(self.fd(), blob_id) } < 0 {
            warn!("failed to destroy property blob {blob_id}: {}", io::Error::last_os_error());
        }
    }
}

struct ConnectorInfo {
    id: u32,
    encoder_id: u32,
    connected: bool,
    encoders: Vec<u32>,
    mode_size: (u32, u32),
}

/// Snapshot a kernel-owned id array before the owning struct is freed.
unsafe fn read_ids(ptr: *const u32, count: c_int) -> Vec<u32> {
    if ptr.is_null() || count <= 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(ptr, count as usize).to_vec()
}

/// Property names are fixed-width and NUL-padded, not guaranteed to be
/// NUL-terminated at full width.
fn prop_name(raw: &[c_char; DRM_PROP_NAME_LEN]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
