//! In-memory `GpuDevice` used by unit tests.
//!
//! Framebuffers own real RGBA storage so tests can fill and read back pixels, and every resource
//! release is appended to an event log so teardown order can be asserted.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;

use dpi::PhysicalSize;

use super::{FRAMEBUFFER_COMPLETE, GlName, GpuDevice, ImageInfo, PixelBufferHandle};
use crate::engine::error::{BridgeError, BridgeResult, RenderError};

pub(crate) const TEXTURE_2D: u32 = 0x0DE1;
pub(crate) const FRAMEBUFFER_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;
pub(crate) const INVALID_OPERATION: u32 = 0x0502;

#[derive(Debug)]
pub(crate) struct SoftwareImage {
    texture: GlName,
    pixel_buffer: PixelBufferHandle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DeviceEvent {
    DeleteFramebuffer(GlName),
    DeleteDepthStencil(GlName),
    DeleteTexture(GlName),
    ReleasePixelBuffer(PixelBufferHandle),
}

struct Texture {
    size: PhysicalSize<u32>,
    pixels: Vec<u8>,
}

struct Framebuffer {
    color: GlName,
    incomplete: bool,
}

#[derive(Default)]
struct State {
    next_name: GlName,
    next_pixel_buffer: u64,
    textures: HashMap<GlName, Texture>,
    pixel_buffers: Vec<PixelBufferHandle>,
    renderbuffers: HashMap<GlName, PhysicalSize<u32>>,
    framebuffers: HashMap<GlName, Framebuffer>,
    bound: Option<(GlName, PhysicalSize<u32>)>,
    current: bool,
    blend: bool,
    flushes: usize,
    incomplete_budget: usize,
    image_failure_budget: usize,
    pending_errors: Vec<u32>,
    make_current_fails: bool,
    events: Vec<DeviceEvent>,
}

impl State {
    fn alloc_name(&mut self) -> GlName {
        self.next_name += 1;
        self.next_name
    }
}

#[derive(Default)]
pub(crate) struct SoftwareDevice {
    state: RefCell<State>,
}

impl SoftwareDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Next `count` framebuffers report `FRAMEBUFFER_INCOMPLETE_ATTACHMENT`.
    pub(crate) fn fail_next_framebuffers(&self, count: usize) {
        self.state.borrow_mut().incomplete_budget = count;
    }

    /// Next `count` shared-image allocations fail.
    pub(crate) fn fail_next_images(&self, count: usize) {
        self.state.borrow_mut().image_failure_budget = count;
    }

    pub(crate) fn inject_error(&self, code: u32) {
        self.state.borrow_mut().pending_errors.push(code);
    }

    pub(crate) fn set_make_current_fails(&self, fails: bool) {
        self.state.borrow_mut().make_current_fails = fails;
    }

    /// Fills the currently bound framebuffer with `rgba`.
    pub(crate) fn fill_bound(&self, rgba: [u8; 4]) -> bool {
        let mut state = self.state.borrow_mut();
        let Some((framebuffer, _)) = state.bound else {
            return false;
        };
        let Some(color) = state.framebuffers.get(&framebuffer).map(|fb| fb.color) else {
            return false;
        };
        match state.textures.get_mut(&color) {
            Some(texture) => {
                for pixel in texture.pixels.chunks_exact_mut(4) {
                    pixel.copy_from_slice(&rgba);
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn bound_framebuffer(&self) -> Option<(GlName, PhysicalSize<u32>)> {
        self.state.borrow().bound
    }

    pub(crate) fn is_current(&self) -> bool {
        self.state.borrow().current
    }

    pub(crate) fn blend_enabled(&self) -> bool {
        self.state.borrow().blend
    }

    pub(crate) fn flushes(&self) -> usize {
        self.state.borrow().flushes
    }

    /// Number of framebuffers, renderbuffers, textures and pixel buffers still alive.
    pub(crate) fn live_resources(&self) -> usize {
        let state = self.state.borrow();
        state.framebuffers.len()
            + state.renderbuffers.len()
            + state.textures.len()
            + state.pixel_buffers.len()
    }

    pub(crate) fn live_framebuffers(&self) -> usize {
        self.state.borrow().framebuffers.len()
    }

    pub(crate) fn events(&self) -> Vec<DeviceEvent> {
        self.state.borrow().events.clone()
    }

    pub(crate) fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }
}

impl GpuDevice for SoftwareDevice {
    type SharedImage = SoftwareImage;

    fn make_current(&self) -> Result<(), RenderError> {
        let mut state = self.state.borrow_mut();
        if state.make_current_fails {
            return Err(RenderError::MakeCurrent("software device refused".to_string()));
        }
        state.current = true;
        Ok(())
    }

    fn release_current(&self) {
        self.state.borrow_mut().current = false;
    }

    fn proc_address(&self, name: &str) -> *const c_void {
        if name.starts_with("gl") {
            // Non-null sentinel; never called.
            std::ptr::NonNull::<c_void>::dangling().as_ptr()
        } else {
            std::ptr::null()
        }
    }

    fn create_shared_image(&self, size: PhysicalSize<u32>) -> BridgeResult<SoftwareImage> {
        let mut state = self.state.borrow_mut();
        if state.image_failure_budget > 0 {
            state.image_failure_budget -= 1;
            return Err(BridgeError::allocation("software pixel buffer exhausted"));
        }
        state.next_pixel_buffer += 1;
        let pixel_buffer = PixelBufferHandle(0x1000 + state.next_pixel_buffer);
        state.pixel_buffers.push(pixel_buffer);

        let texture = state.alloc_name();
        let len = size.width as usize * size.height as usize * 4;
        state.textures.insert(
            texture,
            Texture {
                size,
                pixels: vec![0; len],
            },
        );
        Ok(SoftwareImage {
            texture,
            pixel_buffer,
        })
    }

    fn image_info(&self, image: &SoftwareImage) -> ImageInfo {
        ImageInfo {
            texture: image.texture,
            target: TEXTURE_2D,
            pixel_buffer: image.pixel_buffer,
        }
    }

    fn destroy_shared_image(&self, image: SoftwareImage) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&image.texture);
        state.events.push(DeviceEvent::DeleteTexture(image.texture));
        state.pixel_buffers.retain(|pb| *pb != image.pixel_buffer);
        state
            .events
            .push(DeviceEvent::ReleasePixelBuffer(image.pixel_buffer));
    }

    fn create_depth_stencil(&self, size: PhysicalSize<u32>) -> BridgeResult<GlName> {
        let mut state = self.state.borrow_mut();
        let name = state.alloc_name();
        state.renderbuffers.insert(name, size);
        Ok(name)
    }

    fn delete_depth_stencil(&self, renderbuffer: GlName) {
        let mut state = self.state.borrow_mut();
        state.renderbuffers.remove(&renderbuffer);
        state
            .events
            .push(DeviceEvent::DeleteDepthStencil(renderbuffer));
    }

    fn create_framebuffer(&self, image: &ImageInfo, depth_stencil: GlName) -> BridgeResult<GlName> {
        let mut state = self.state.borrow_mut();
        let attachments_match = match (
            state.textures.get(&image.texture),
            state.renderbuffers.get(&depth_stencil),
        ) {
            (Some(texture), Some(depth)) => texture.size == *depth,
            _ => false,
        };
        let forced = state.incomplete_budget > 0;
        if forced {
            state.incomplete_budget -= 1;
        }
        let name = state.alloc_name();
        state.framebuffers.insert(
            name,
            Framebuffer {
                color: image.texture,
                incomplete: forced || !attachments_match,
            },
        );
        Ok(name)
    }

    fn framebuffer_status(&self, framebuffer: GlName) -> u32 {
        match self.state.borrow().framebuffers.get(&framebuffer) {
            Some(fb) if !fb.incomplete => FRAMEBUFFER_COMPLETE,
            _ => FRAMEBUFFER_INCOMPLETE_ATTACHMENT,
        }
    }

    fn delete_framebuffer(&self, framebuffer: GlName) {
        let mut state = self.state.borrow_mut();
        state.framebuffers.remove(&framebuffer);
        state
            .events
            .push(DeviceEvent::DeleteFramebuffer(framebuffer));
    }

    fn begin_draw(&self, framebuffer: GlName, size: PhysicalSize<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound = Some((framebuffer, size));
        state.blend = true;
    }

    fn end_draw(&self) {
        let mut state = self.state.borrow_mut();
        state.flushes += 1;
        state.bound = None;
    }

    fn take_error(&self) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        if state.pending_errors.is_empty() {
            None
        } else {
            Some(state.pending_errors.remove(0))
        }
    }

    fn read_pixels(&self, framebuffer: GlName, size: PhysicalSize<u32>) -> Vec<u8> {
        let state = self.state.borrow();
        let Some(texture) = state
            .framebuffers
            .get(&framebuffer)
            .and_then(|fb| state.textures.get(&fb.color))
        else {
            return Vec::new();
        };
        let len = size.width as usize * size.height as usize * 4;
        texture.pixels.iter().copied().take(len).collect()
    }
}
