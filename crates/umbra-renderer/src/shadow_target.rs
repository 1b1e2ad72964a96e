//! Off-screen depth target for the light-space pass.

use crate::backend::{RenderBackend, RenderError, TargetHandle};

/// Square depth-only target, sized once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowTarget {
    handle: TargetHandle,
    size: u32,
}

impl ShadowTarget {
    /// Allocate a `size` x `size` depth target.
    pub fn new<B: RenderBackend>(backend: &mut B, size: u32) -> Result<Self, RenderError> {
        if size == 0 {
            return Err(RenderError::InvalidShadowMapSize(size));
        }
        let handle = backend.create_depth_target(size)?;
        tracing::debug!("Created {}x{} shadow target", size, size);
        Ok(Self { handle, size })
    }

    /// Backend handle, for sampling in later passes.
    pub fn handle(&self) -> TargetHandle {
        self.handle
    }

    /// Edge length in texels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Start rendering into the target.
    ///
    /// Draws go to the target until the returned guard is dropped.
    pub fn start<'a, B: RenderBackend>(
        &self,
        backend: &'a mut B,
    ) -> Result<ShadowPass<'a, B>, RenderError> {
        backend.begin_depth_pass(self.handle)?;
        Ok(ShadowPass { backend })
    }
}

/// Depth pass in progress; dropping it restores the output surface
pub struct ShadowPass<'a, B: RenderBackend> {
    backend: &'a mut B,
}

impl<B: RenderBackend> ShadowPass<'_, B> {
    /// Backend to issue depth draws through.
    pub fn backend(&mut self) -> &mut B {
        self.backend
    }

    /// End the pass explicitly.
    pub fn stop(self) {}
}

impl<B: RenderBackend> Drop for ShadowPass<'_, B> {
    fn drop(&mut self) {
        self.backend.end_depth_pass();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{GpuCall, RecordingBackend};

    #[test]
    fn test_zero_size_rejected() {
        let mut backend = RecordingBackend::new(800, 600);
        assert_eq!(
            ShadowTarget::new(&mut backend, 0),
            Err(RenderError::InvalidShadowMapSize(0))
        );
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_pass_ends_on_drop() {
        let mut backend = RecordingBackend::new(800, 600);
        let target = ShadowTarget::new(&mut backend, 2048).unwrap();

        {
            let mut pass = target.start(&mut backend).unwrap();
            assert!(pass.backend().in_depth_pass());
        }
        assert!(!backend.in_depth_pass());

        let calls = backend.take_calls();
        assert_eq!(
            calls,
            vec![
                GpuCall::CreateDepthTarget(2048),
                GpuCall::BeginDepthPass(target.handle()),
                GpuCall::EndDepthPass,
            ]
        );
    }

    #[test]
    fn test_pass_ends_on_early_return() {
        fn fails_midway(target: &ShadowTarget, backend: &mut RecordingBackend) -> Result<(), RenderError> {
            let _pass = target.start(backend)?;
            Err(RenderError::SurfaceUnavailable)
        }

        let mut backend = RecordingBackend::new(800, 600);
        let target = ShadowTarget::new(&mut backend, 512).unwrap();
        assert!(fails_midway(&target, &mut backend).is_err());
        assert!(!backend.in_depth_pass());
        assert_eq!(backend.calls.last(), Some(&GpuCall::EndDepthPass));
    }
}
