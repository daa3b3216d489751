use crate::error::{RenderError, Result};
use crate::grid::WORKGROUP_SIZE;

pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Picks an adapter (compatible with `surface` when given) and opens a device with
    /// limits large enough for 32x32 compute tiles.
    pub async fn new(instance: wgpu::Instance, surface: Option<&wgpu::Surface<'_>>) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: surface,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let required_limits = required_limits(&adapter.limits())?;
        // Read-only rgba32float storage textures need this on some native backends.
        let required_features =
            adapter.features() & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Tracer Device"),
                    required_features,
                    required_limits,
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        // Only reached by work outside `validated`, i.e. the interactive frame loop.
        device.on_uncaptured_error(Box::new(|error| {
            log::error!("wgpu error: {error}");
        }));

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Runs `f` inside a validation and out-of-memory error scope. Any error the device
    /// reports while `f` runs is returned instead of being logged.
    pub fn validated<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = f(self);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(error) => Err(error.into()),
            None => result,
        }
    }
}

/// Rejects targets the device cannot hold in a single 2D texture.
pub fn check_target_size(limits: &wgpu::Limits, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize { width, height });
    }
    let max = limits.max_texture_dimension_2d;
    if width > max || height > max {
        return Err(RenderError::TooLarge { width, height, max });
    }
    Ok(())
}

/// Device limits to request from an adapter that reports `available`.
pub fn required_limits(available: &wgpu::Limits) -> Result<wgpu::Limits> {
    let tile_invocations = WORKGROUP_SIZE * WORKGROUP_SIZE;
    let checks = [
        (
            "max_compute_invocations_per_workgroup",
            tile_invocations,
            available.max_compute_invocations_per_workgroup,
        ),
        (
            "max_compute_workgroup_size_x",
            WORKGROUP_SIZE,
            available.max_compute_workgroup_size_x,
        ),
        (
            "max_compute_workgroup_size_y",
            WORKGROUP_SIZE,
            available.max_compute_workgroup_size_y,
        ),
    ];
    for (what, required, available) in checks {
        if available < required {
            return Err(RenderError::UnsupportedLimits {
                what,
                required,
                available,
            });
        }
    }

    let mut limits = wgpu::Limits::downlevel_defaults().using_resolution(available.clone());
    // Headless readback of a large target needs one buffer the size of the image.
    limits.max_buffer_size = available.max_buffer_size;
    limits.max_compute_invocations_per_workgroup = tile_invocations;
    limits.max_compute_workgroup_size_x = limits.max_compute_workgroup_size_x.max(WORKGROUP_SIZE);
    limits.max_compute_workgroup_size_y = limits.max_compute_workgroup_size_y.max(WORKGROUP_SIZE);
    Ok(limits)
}

/// Device for tests that need a GPU, or `None` when this machine has no usable one.
#[cfg(test)]
pub(crate) fn test_context() -> Option<GpuContext> {
    match pollster::block_on(GpuContext::new(wgpu::Instance::default(), None)) {
        Ok(context) => Some(context),
        Err(
            err @ (RenderError::NoAdapter
            | RenderError::UnsupportedLimits { .. }
            | RenderError::RequestDevice(_)),
        ) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
        Err(err) => panic!("unexpected device error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_too_small_for_tiles() {
        let err = required_limits(&wgpu::Limits::default()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnsupportedLimits {
                what: "max_compute_invocations_per_workgroup",
                required: 1024,
                available: 256,
            }
        ));
    }

    #[test]
    fn test_requests_full_tile() {
        let available = wgpu::Limits {
            max_compute_invocations_per_workgroup: 1024,
            max_texture_dimension_2d: 16384,
            ..Default::default()
        };
        let limits = required_limits(&available).unwrap();
        assert_eq!(limits.max_compute_invocations_per_workgroup, 1024);
        assert!(limits.max_compute_workgroup_size_x >= 32);
        assert!(limits.max_compute_workgroup_size_y >= 32);
        assert_eq!(limits.max_texture_dimension_2d, 16384);
        assert_eq!(limits.max_buffer_size, available.max_buffer_size);
        assert!(limits.check_limits(&available));
    }

    #[test]
    fn test_target_size_checked_against_texture_limit() {
        let limits = wgpu::Limits {
            max_texture_dimension_2d: 8192,
            ..Default::default()
        };
        assert!(check_target_size(&limits, 8192, 8192).is_ok());
        assert!(matches!(
            check_target_size(&limits, 70000, 4),
            Err(RenderError::TooLarge {
                width: 70000,
                height: 4,
                max: 8192
            })
        ));
        assert!(matches!(
            check_target_size(&limits, 4, 8193),
            Err(RenderError::TooLarge { .. })
        ));
        assert!(matches!(
            check_target_size(&limits, 0, 4),
            Err(RenderError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_validation_errors_are_returned() {
        let Some(context) = test_context() else {
            return;
        };
        // MAP_READ may only be paired with COPY_DST.
        let result = context.validated(|context| {
            context.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Invalid Buffer"),
                size: 256,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::STORAGE,
                mapped_at_creation: false,
            });
            Ok(())
        });
        assert!(matches!(result, Err(RenderError::Device(_))), "{result:?}");

        let result = context.validated(|_| Ok(7));
        assert!(matches!(result, Ok(7)));
    }
}
