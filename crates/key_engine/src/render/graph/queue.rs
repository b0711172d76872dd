//! Job-collecting render pass

use std::sync::Arc;

use crate::core::{EngineError, EngineResult};
use crate::render::bindable::{Bindable, RenderSurface};
use crate::render::graphics::GraphicsDevice;

use super::link::{Binder, Linker};
use super::pass::{Pass, PassCore};

/// One queued draw: the bindables to apply and the indexed draw to issue
pub struct Job {
    bindables: Vec<Arc<dyn Bindable>>,
    index_count: u32,
    camera_distance: f32,
}

impl Job {
    /// Create a job
    ///
    /// `camera_distance` orders jobs within the pass for the frame.
    pub fn new(bindables: Vec<Arc<dyn Bindable>>, index_count: u32, camera_distance: f32) -> Self {
        Self {
            bindables,
            index_count,
            camera_distance,
        }
    }

    fn execute(&self, device: &mut dyn GraphicsDevice) {
        for bindable in &self.bindables {
            bindable.bind(device);
        }
        device.draw_indexed(self.index_count);
    }
}

/// Draw order of queued jobs relative to the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Near jobs first; standard for opaque geometry
    FrontToBack,
    /// Far jobs first; required for transparency
    BackToFront,
}

/// Pass that draws jobs submitted for the current frame
///
/// Meshes submit jobs each frame; the pass binds its linked render target
/// and depth surfaces, draws the jobs sorted by camera distance, and is
/// reset by the graph afterwards.
pub struct RenderQueuePass {
    core: PassCore,
    jobs: Vec<Job>,
    order: SortOrder,
}

impl RenderQueuePass {
    /// Render target input/output name
    pub const RENDER_TARGET: &'static str = "renderTarget";
    /// Depth buffer input/output name
    pub const DEPTH: &'static str = "depthStencil";

    /// Create a queue pass with surface inputs and forwarding outputs
    pub fn new(name: &str, order: SortOrder) -> Self {
        let mut core = PassCore::new(name);
        core.register_binder(Binder::new::<RenderSurface>(Self::RENDER_TARGET))
            .expect("fresh core has no inputs");
        core.register_binder(Binder::new::<RenderSurface>(Self::DEPTH))
            .expect("fresh core has no inputs");
        core.register_linker(Linker::deferred(Self::RENDER_TARGET))
            .expect("fresh core has no outputs");
        core.register_linker(Linker::deferred(Self::DEPTH))
            .expect("fresh core has no outputs");
        Self {
            core,
            jobs: Vec::new(),
            order,
        }
    }

    /// Queue a job for the current frame
    pub fn submit(&mut self, job: Job) {
        self.jobs.push(job);
    }

    /// Number of jobs queued this frame
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Configured draw order
    pub fn sort_order(&self) -> SortOrder {
        self.order
    }

    fn sorted_jobs(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.iter().collect();
        match self.order {
            SortOrder::FrontToBack => {
                jobs.sort_by(|a, b| a.camera_distance.total_cmp(&b.camera_distance));
            }
            SortOrder::BackToFront => {
                jobs.sort_by(|a, b| b.camera_distance.total_cmp(&a.camera_distance));
            }
        }
        jobs
    }

    fn forward(&mut self, slot: &'static str) -> EngineResult<()> {
        let resource = self
            .core
            .binder(slot)
            .and_then(Binder::resource)
            .cloned()
            .ok_or_else(|| {
                EngineError::renderer(format!(
                    "queue pass '{}' linked without its '{slot}' surface",
                    self.core.name()
                ))
            })?;
        self.core
            .linker_mut(slot)
            .expect("outputs registered in constructor")
            .provide(resource);
        Ok(())
    }
}

impl Pass for RenderQueuePass {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn binders(&self) -> &[Binder] {
        self.core.binders()
    }

    fn binders_mut(&mut self) -> &mut [Binder] {
        self.core.binders_mut()
    }

    fn fetch_output(&self, name: &str) -> EngineResult<Arc<dyn Bindable>> {
        self.core.fetch_output(name)
    }

    fn post_link(&mut self) -> EngineResult<()> {
        self.forward(Self::RENDER_TARGET)?;
        self.forward(Self::DEPTH)
    }

    fn execute(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        for slot in [Self::RENDER_TARGET, Self::DEPTH] {
            let surface = self
                .core
                .binder(slot)
                .and_then(Binder::resource)
                .ok_or_else(|| {
                    EngineError::renderer(format!(
                        "queue pass '{}' executed before linking",
                        self.core.name()
                    ))
                })?;
            surface.bind(device);
        }
        for job in self.sorted_jobs() {
            job.execute(device);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.jobs.clear();
    }

    fn as_queue_pass(&mut self) -> Option<&mut RenderQueuePass> {
        Some(self)
    }
}
