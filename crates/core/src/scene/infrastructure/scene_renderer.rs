use crate::export::domain::frame_source::FrameSource;
use crate::export::infrastructure::cpu_framebuffer::CpuFramebuffer;
use crate::export::infrastructure::gpu_framebuffer::GpuFramebuffer;
use crate::scene::domain::scene::Scene;
use crate::scene::infrastructure::plasma_scene::PlasmaScene;
use crate::shared::export_error::ExportError;
use crate::shared::rect_size::RectSize;

/// Draws the demo scene into either a CPU or a GPU framebuffer.
pub enum SceneRenderer {
    Cpu {
        framebuffer: CpuFramebuffer,
        scene: PlasmaScene,
    },
    Gpu(GpuFramebuffer),
}

impl SceneRenderer {
    pub fn cpu(size: RectSize) -> Self {
        SceneRenderer::Cpu {
            framebuffer: CpuFramebuffer::new(size),
            scene: PlasmaScene::new(),
        }
    }

    /// GPU renderer, falling back to the CPU when no adapter is available.
    pub fn gpu_or_cpu(size: RectSize) -> Self {
        match GpuFramebuffer::new(size) {
            Ok(framebuffer) => SceneRenderer::Gpu(framebuffer),
            Err(e) => {
                log::warn!("{e}, rendering on the CPU instead");
                Self::cpu(size)
            }
        }
    }

    /// Renders one frame at `size`, resizing the framebuffer first if needed.
    pub fn render(&mut self, size: RectSize, time: f64) -> Result<(), ExportError> {
        match self {
            SceneRenderer::Cpu { framebuffer, scene } => {
                framebuffer.resize(size);
                scene.render(time, framebuffer.frame_mut());
            }
            SceneRenderer::Gpu(framebuffer) => {
                framebuffer.resize(size)?;
                framebuffer.render(time);
            }
        }
        Ok(())
    }

    pub fn source(&mut self) -> &mut dyn FrameSource {
        match self {
            SceneRenderer::Cpu { framebuffer, .. } => framebuffer,
            SceneRenderer::Gpu(framebuffer) => framebuffer,
        }
    }

    pub fn is_gpu(&self) -> bool {
        matches!(self, SceneRenderer::Gpu(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_render_resizes_framebuffer() {
        let mut renderer = SceneRenderer::cpu(RectSize::new(8, 8).unwrap());
        let size = RectSize::new(3, 5).unwrap();
        renderer.render(size, 0.0).unwrap();
        assert!(!renderer.is_gpu());
        assert_eq!(renderer.source().size(), size);
        let frame = renderer.source().read_pixels(size).unwrap();
        assert!(frame.data().chunks_exact(4).all(|p| p[3] == 255));
    }
}
