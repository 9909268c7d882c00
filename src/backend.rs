//! Backend selection for the Burn framework.
//!
//! The default backend is NdArray (CPU), which runs everywhere and keeps
//! inference deterministic. Enabling the `cuda` feature switches the whole
//! service to the CUDA backend; both networks always run on the same backend
//! so the fused tensor never crosses devices.

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(not(feature = "cuda"))]
pub type DefaultBackend = burn_ndarray::NdArray;

/// Get the default device for the selected backend
pub fn default_device() -> <DefaultBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }
    #[cfg(not(feature = "cuda"))]
    {
        "NdArray (CPU)"
    }
}
