// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use crate::frame::{FourCC, PrimeDescriptor, VideoFrame};
use std::error::Error;
use std::ops::Deref;

/// Buffer-producing backend a [`PlaneRenderer`] can compose over.
///
/// A decoder whose output is not device-native (for example a stateful V4L2
/// decoder handing out its own buffer type) implements this to translate
/// each frame into a PRIME descriptor the display path can import. The
/// leaf case, where frames already carry a descriptor, needs no backend.
///
/// [`PlaneRenderer`]: crate::present::PlaneRenderer
pub trait FrameBackend {
    /// Map a frame into a PRIME descriptor.
    ///
    /// Every successful map must be balanced by exactly one
    /// [`unmap_frame`](FrameBackend::unmap_frame); the [`MappedFrame`]
    /// guard takes care of that.
    fn map_frame(&self, frame: &VideoFrame) -> Result<PrimeDescriptor, Box<dyn Error>>;

    /// Release a mapping produced by `map_frame`.
    fn unmap_frame(&self, descriptor: &PrimeDescriptor);

    /// Whether this backend can produce PRIME descriptors at all.
    ///
    /// A `true` here is a static claim only; the first real frame through
    /// [`map_frame`](FrameBackend::map_frame) is the authoritative probe.
    fn can_export_prime(&self) -> bool;

    /// Pixel format this backend wants the decoder to produce.
    fn preferred_format(&self) -> FourCC;
}

/// Scoped backend mapping: unmaps exactly once when dropped, on every
/// exit path.
pub struct MappedFrame<'a> {
    descriptor: PrimeDescriptor,
    backend: &'a dyn FrameBackend,
}

impl<'a> MappedFrame<'a> {
    pub fn map(backend: &'a dyn FrameBackend, frame: &VideoFrame) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            descriptor: backend.map_frame(frame)?,
            backend,
        })
    }
}

impl Deref for MappedFrame<'_> {
    type Target = PrimeDescriptor;

    fn deref(&self) -> &PrimeDescriptor {
        &self.descriptor
    }
}

impl Drop for MappedFrame<'_> {
    fn drop(&mut self) {
        self.backend.unmap_frame(&self.descriptor);
    }
}
