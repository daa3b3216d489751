use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable graphics adapter found")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("surface is not supported by the selected adapter")]
    SurfaceUnsupported,

    #[error("adapter limit {what} is {available}, need at least {required}")]
    UnsupportedLimits {
        what: &'static str,
        required: u32,
        available: u32,
    },

    #[error("invalid render size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("render size {width}x{height} exceeds the device texture limit of {max}")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("GPU error: {0}")]
    Device(#[from] wgpu::Error),

    #[error("failed to map readback buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("readback channel closed before the buffer was mapped")]
    ReadbackChannel(#[from] std::sync::mpsc::RecvError),

    #[error("failed to save image: {0}")]
    ImageSave(#[from] image::ImageError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
