//! Render graph
//!
//! Passes are appended in execution order and wired together through named
//! links: each pass input (binder) names a `pass.output` target whose
//! resource it receives, with `$` targets resolving against the graph's
//! global surfaces. Linking is validated once, at append/finalize time, so
//! per-frame execution does no lookups.
//!
//! The graph owns the back buffer and master depth surfaces, exposes them as
//! `$.backbuffer` and `$.masterDepth`, and pulls the final surfaces back
//! through its global binders when the frame is done.

mod link;
mod pass;
mod queue;

pub use link::{Binder, LinkTarget, Linker};
pub use pass::{ClearSurfacePass, Pass, PassCore};
pub use queue::{Job, RenderQueuePass, SortOrder};

use std::sync::Arc;

use crate::core::{EngineError, EngineResult};
use crate::render::bindable::{Bindable, RenderSurface, SurfaceKind};
use crate::render::graphics::GraphicsDevice;

/// Ordered pass pipeline with validated links
pub struct RenderGraph {
    passes: Vec<Box<dyn Pass>>,
    global_linkers: Vec<Linker>,
    global_binders: Vec<Binder>,
    finalized: bool,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    /// Global back buffer output name
    pub const BACKBUFFER: &'static str = "backbuffer";
    /// Global depth buffer output name
    pub const MASTER_DEPTH: &'static str = "masterDepth";

    /// Create a graph owning the back buffer and master depth surfaces
    pub fn new() -> Self {
        let backbuffer: Arc<dyn Bindable> =
            Arc::new(RenderSurface::new(Self::BACKBUFFER, SurfaceKind::Color));
        let depth: Arc<dyn Bindable> =
            Arc::new(RenderSurface::new(Self::MASTER_DEPTH, SurfaceKind::Depth));
        Self {
            global_linkers: vec![
                Linker::new(Self::BACKBUFFER, backbuffer),
                Linker::new(Self::MASTER_DEPTH, depth),
            ],
            global_binders: vec![
                Binder::new::<RenderSurface>(Self::BACKBUFFER),
                Binder::new::<RenderSurface>(Self::MASTER_DEPTH),
            ],
            passes: Vec::new(),
            finalized: false,
        }
    }

    /// Append a pass, resolving all of its input targets immediately
    ///
    /// Every binder must have a target pointing at a global output or at an
    /// output of an already-appended pass.
    pub fn append_pass(&mut self, mut pass: Box<dyn Pass>) -> EngineResult<()> {
        if self.finalized {
            return Err(EngineError::renderer(
                "cannot append passes to a finalized render graph",
            ));
        }
        if self.passes.iter().any(|p| p.name() == pass.name()) {
            return Err(EngineError::renderer(format!(
                "render graph already contains a pass named '{}'",
                pass.name()
            )));
        }
        let pass_name = pass.name().to_string();
        for binder in pass.binders_mut() {
            let Some(target) = binder.target().cloned() else {
                return Err(EngineError::renderer(format!(
                    "pass '{pass_name}' input '{}' has no target set",
                    binder.name()
                )));
            };
            let resource = resolve(&self.passes, &self.global_linkers, &target)?;
            binder.link(resource)?;
        }
        pass.post_link()?;
        log::debug!("render graph: appended pass '{pass_name}'");
        self.passes.push(pass);
        Ok(())
    }

    /// Set the input target of a not-yet-appended pass
    pub fn set_pass_binder_target(
        pass: &mut dyn Pass,
        binder: &str,
        target: &str,
    ) -> EngineResult<()> {
        let pass_name = pass.name().to_string();
        pass.binders_mut()
            .iter_mut()
            .find(|b| b.name() == binder)
            .ok_or_else(|| {
                EngineError::renderer(format!(
                    "pass '{pass_name}' has no input named '{binder}'"
                ))
            })?
            .set_target(target)
    }

    /// Point a graph output at the pass producing the final surface
    pub fn set_global_binder_target(&mut self, name: &str, target: &str) -> EngineResult<()> {
        self.global_binders
            .iter_mut()
            .find(|b| b.name() == name)
            .ok_or_else(|| {
                EngineError::renderer(format!("render graph has no global input named '{name}'"))
            })?
            .set_target(target)
    }

    /// Resolve the graph outputs and verify every pass is fully wired
    pub fn finalize(&mut self) -> EngineResult<()> {
        if self.finalized {
            return Ok(());
        }
        for binder in &mut self.global_binders {
            let Some(target) = binder.target().cloned() else {
                return Err(EngineError::renderer(format!(
                    "render graph output '{}' has no target set",
                    binder.name()
                )));
            };
            if target.is_global() {
                return Err(EngineError::renderer(format!(
                    "render graph output '{}' cannot target another global",
                    binder.name()
                )));
            }
            let resource = resolve(&self.passes, &self.global_linkers, &target)?;
            binder.link(resource)?;
        }
        for pass in &mut self.passes {
            pass.finalize()?;
        }
        self.finalized = true;
        log::info!("render graph finalized with {} passes", self.passes.len());
        Ok(())
    }

    /// Whether [`RenderGraph::finalize`] has completed
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Execute every pass in append order
    pub fn execute(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        if !self.finalized {
            return Err(EngineError::renderer(
                "render graph must be finalized before execution",
            ));
        }
        for pass in &self.passes {
            pass.execute(device)?;
        }
        Ok(())
    }

    /// Drop all per-frame pass state; call after each execution
    pub fn reset(&mut self) {
        for pass in &mut self.passes {
            pass.reset();
        }
    }

    /// Number of appended passes
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Mutable access to a queue pass for job submission
    pub fn queue_pass(&mut self, name: &str) -> EngineResult<&mut RenderQueuePass> {
        self.passes
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| {
                EngineError::renderer(format!("render graph has no pass named '{name}'"))
            })?
            .as_queue_pass()
            .ok_or_else(|| {
                EngineError::renderer(format!("pass '{name}' does not accept render jobs"))
            })
    }
}

fn resolve(
    passes: &[Box<dyn Pass>],
    globals: &[Linker],
    target: &LinkTarget,
) -> EngineResult<Arc<dyn Bindable>> {
    if target.is_global() {
        return globals
            .iter()
            .find(|l| l.name() == target.output)
            .ok_or_else(|| {
                EngineError::renderer(format!(
                    "render graph has no global output named '{}'",
                    target.output
                ))
            })?
            .fetch();
    }
    passes
        .iter()
        .find(|p| p.name() == target.pass)
        .ok_or_else(|| {
            EngineError::renderer(format!(
                "link target '{}.{}' does not name an appended pass",
                target.pass, target.output
            ))
        })?
        .fetch_output(&target.output)
}
