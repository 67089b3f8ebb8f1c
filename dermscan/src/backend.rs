//! Backend selection
//!
//! The default backend is chosen at compile time via cargo features.
//! `ndarray` (CPU) is the default; build with
//! `--no-default-features --features wgpu` for GPU execution.

use burn::backend::Autodiff;

#[cfg(feature = "ndarray")]
pub type DefaultBackend = burn::backend::NdArray<f32>;

#[cfg(all(feature = "wgpu", not(feature = "ndarray")))]
pub type DefaultBackend = burn::backend::Wgpu;

#[cfg(not(any(feature = "ndarray", feature = "wgpu")))]
compile_error!("No backend selected! Enable the `ndarray` or `wgpu` feature.");

/// Backend with gradient tracking, used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Default device for the selected backend
pub fn default_device() -> <DefaultBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

/// Human-readable name of the selected backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "ndarray")]
    {
        "ndarray (CPU)"
    }
    #[cfg(all(feature = "wgpu", not(feature = "ndarray")))]
    {
        "wgpu (GPU)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::prelude::*;

    #[test]
    fn test_default_device_builds_tensors() {
        let device = default_device();
        let tensor = Tensor::<DefaultBackend, 1>::from_floats([1.0, 2.0], &device);
        assert_eq!(tensor.dims(), [2]);
    }

    #[test]
    fn test_backend_name() {
        assert!(!backend_name().is_empty());
    }
}
