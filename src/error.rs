use thiserror::Error;

/// Library error type for carousel setup and export.
///
/// Everything here surfaces once, at construction time. Per-frame failures are
/// logged and contained by the viewer instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The host window could not be created.
    #[error("failed to create carousel window: {0}")]
    Window(#[from] winit::error::OsError),

    /// The drawing surface could not be created for the window.
    #[error("failed to create drawing surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// No adapter can present to the surface.
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to hand out a device.
    #[error("failed to acquire GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// No system font could be resolved for the given role.
    #[error("no usable font found for {0} text")]
    FontUnavailable(&'static str),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// PNG encoding error while exporting card bitmaps.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
