//! Render pass trait and building blocks

use std::sync::Arc;

use crate::core::{EngineError, EngineResult};
use crate::render::bindable::{Bindable, RenderSurface};
use crate::render::graphics::{ClearValue, GraphicsDevice};

use super::link::{Binder, Linker};
use super::queue::RenderQueuePass;

/// One step of the render graph
pub trait Pass {
    /// Pass name, unique within a graph
    fn name(&self) -> &str;

    /// Declared inputs
    fn binders(&self) -> &[Binder];

    /// Declared inputs, mutable (used by the graph while linking)
    fn binders_mut(&mut self) -> &mut [Binder];

    /// Fetch an output's resource for a downstream binder
    fn fetch_output(&self, name: &str) -> EngineResult<Arc<dyn Bindable>>;

    /// Run the pass against the device
    fn execute(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()>;

    /// Hook run after the graph has resolved this pass's binders
    fn post_link(&mut self) -> EngineResult<()> {
        Ok(())
    }

    /// Verify the pass is fully wired; run once at graph finalization
    fn finalize(&mut self) -> EngineResult<()> {
        if let Some(unlinked) = self.binders().iter().find(|b| !b.is_linked()) {
            return Err(EngineError::renderer(format!(
                "pass '{}' input '{}' was never linked",
                self.name(),
                unlinked.name()
            )));
        }
        Ok(())
    }

    /// Drop per-frame state; run after every graph execution
    fn reset(&mut self) {}

    /// Downcast support for job submission
    fn as_queue_pass(&mut self) -> Option<&mut RenderQueuePass> {
        None
    }
}

/// Name, binder and linker bookkeeping shared by pass implementations
pub struct PassCore {
    name: String,
    binders: Vec<Binder>,
    linkers: Vec<Linker>,
}

impl PassCore {
    /// Create a pass core with no inputs or outputs
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            binders: Vec::new(),
            linkers: Vec::new(),
        }
    }

    /// Pass name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare an input; names must be unique within the pass
    pub fn register_binder(&mut self, binder: Binder) -> EngineResult<()> {
        if self.binders.iter().any(|b| b.name() == binder.name()) {
            return Err(EngineError::renderer(format!(
                "pass '{}' already has an input named '{}'",
                self.name,
                binder.name()
            )));
        }
        self.binders.push(binder);
        Ok(())
    }

    /// Declare an output; names must be unique within the pass
    pub fn register_linker(&mut self, linker: Linker) -> EngineResult<()> {
        if self.linkers.iter().any(|l| l.name() == linker.name()) {
            return Err(EngineError::renderer(format!(
                "pass '{}' already has an output named '{}'",
                self.name,
                linker.name()
            )));
        }
        self.linkers.push(linker);
        Ok(())
    }

    /// Inputs in declaration order
    pub fn binders(&self) -> &[Binder] {
        &self.binders
    }

    /// Inputs in declaration order, mutable
    pub fn binders_mut(&mut self) -> &mut [Binder] {
        &mut self.binders
    }

    /// Look up an input by name
    pub fn binder(&self, name: &str) -> Option<&Binder> {
        self.binders.iter().find(|b| b.name() == name)
    }

    /// Look up an input by name, mutable
    pub fn binder_mut(&mut self, name: &str) -> Option<&mut Binder> {
        self.binders.iter_mut().find(|b| b.name() == name)
    }

    /// Look up an output by name, mutable
    pub fn linker_mut(&mut self, name: &str) -> Option<&mut Linker> {
        self.linkers.iter_mut().find(|l| l.name() == name)
    }

    /// Fetch an output's resource by name
    pub fn fetch_output(&self, name: &str) -> EngineResult<Arc<dyn Bindable>> {
        self.linkers
            .iter()
            .find(|l| l.name() == name)
            .ok_or_else(|| {
                EngineError::renderer(format!(
                    "pass '{}' has no output named '{name}'",
                    self.name
                ))
            })?
            .fetch()
    }
}

/// Pass that clears the surface flowing through it
///
/// Takes a surface on the `buffer` input, clears it, and re-exposes the same
/// surface on the `buffer` output for downstream passes.
pub struct ClearSurfacePass {
    core: PassCore,
    value: ClearValue,
}

impl ClearSurfacePass {
    /// Input and output name
    pub const BUFFER: &'static str = "buffer";

    /// Create a clear pass writing `value`
    pub fn new(name: &str, value: ClearValue) -> Self {
        let mut core = PassCore::new(name);
        core.register_binder(Binder::new::<RenderSurface>(Self::BUFFER))
            .expect("fresh core has no inputs");
        core.register_linker(Linker::deferred(Self::BUFFER))
            .expect("fresh core has no outputs");
        Self { core, value }
    }
}

impl Pass for ClearSurfacePass {
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
        let resource = self
            .core
            .binder(Self::BUFFER)
            .and_then(Binder::resource)
            .cloned()
            .ok_or_else(|| {
                EngineError::renderer(format!(
                    "clear pass '{}' linked without a surface",
                    self.core.name()
                ))
            })?;
        self.core
            .linker_mut(Self::BUFFER)
            .expect("output registered in constructor")
            .provide(resource);
        Ok(())
    }

    fn execute(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        let surface = self
            .core
            .binder(Self::BUFFER)
            .and_then(Binder::resource_as::<RenderSurface>)
            .ok_or_else(|| {
                EngineError::renderer(format!(
                    "clear pass '{}' executed before linking",
                    self.core.name()
                ))
            })?;
        surface.clear(device, self.value);
        Ok(())
    }
}
