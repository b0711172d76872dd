//! Typed inputs and outputs connecting passes

use std::any::TypeId;
use std::sync::Arc;

use crate::core::{EngineError, EngineResult};
use crate::render::bindable::Bindable;

/// Where a binder pulls its resource from
///
/// Written as `pass.output`; the pass name `$` refers to the graph's global
/// outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Producing pass name, `$` for graph globals
    pub pass: String,
    /// Linker name on the producing pass
    pub output: String,
}

impl LinkTarget {
    /// Parse a `pass.output` target string
    pub fn parse(target: &str) -> EngineResult<Self> {
        let Some((pass, output)) = target.split_once('.') else {
            return Err(EngineError::renderer(format!(
                "link target '{target}' must have the form 'pass.output'"
            )));
        };
        if pass.is_empty() || output.is_empty() || output.contains('.') {
            return Err(EngineError::renderer(format!(
                "malformed link target '{target}'"
            )));
        }
        Ok(Self {
            pass: pass.to_string(),
            output: output.to_string(),
        })
    }

    /// Whether the target points at graph globals
    pub fn is_global(&self) -> bool {
        self.pass == "$"
    }
}

/// Pass input slot expecting a resource of a fixed bindable type
pub struct Binder {
    name: String,
    target: Option<LinkTarget>,
    expected: TypeId,
    expected_name: &'static str,
    resource: Option<Arc<dyn Bindable>>,
}

impl Binder {
    /// Declare an input expecting a bindable of concrete type `B`
    pub fn new<B: Bindable + 'static>(name: &str) -> Self {
        Self {
            name: name.to_string(),
            target: None,
            expected: TypeId::of::<B>(),
            expected_name: std::any::type_name::<B>(),
            resource: None,
        }
    }

    /// Input name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point this input at `pass.output`
    pub fn set_target(&mut self, target: &str) -> EngineResult<()> {
        self.target = Some(LinkTarget::parse(target)?);
        Ok(())
    }

    /// The configured target, if any
    pub fn target(&self) -> Option<&LinkTarget> {
        self.target.as_ref()
    }

    /// Accept a resource, verifying its concrete type
    pub fn link(&mut self, resource: Arc<dyn Bindable>) -> EngineResult<()> {
        if resource.as_any().type_id() != self.expected {
            return Err(EngineError::renderer(format!(
                "binder '{}' expects a {} but its target provides a different bindable type",
                self.name, self.expected_name,
            )));
        }
        self.resource = Some(resource);
        Ok(())
    }

    /// Whether a resource has been linked in
    pub fn is_linked(&self) -> bool {
        self.resource.is_some()
    }

    /// The linked resource
    pub fn resource(&self) -> Option<&Arc<dyn Bindable>> {
        self.resource.as_ref()
    }

    /// The linked resource downcast to its concrete type
    pub fn resource_as<B: Bindable + 'static>(&self) -> Option<&B> {
        self.resource.as_ref()?.as_any().downcast_ref()
    }
}

/// Pass output slot exposing a resource to downstream binders
pub struct Linker {
    name: String,
    resource: Option<Arc<dyn Bindable>>,
}

impl Linker {
    /// Declare an output providing `resource`
    pub fn new(name: &str, resource: Arc<dyn Bindable>) -> Self {
        Self {
            name: name.to_string(),
            resource: Some(resource),
        }
    }

    /// Declare an output filled in later (forwarding passes)
    pub fn deferred(name: &str) -> Self {
        Self {
            name: name.to_string(),
            resource: None,
        }
    }

    /// Output name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provide the resource of a deferred output
    pub fn provide(&mut self, resource: Arc<dyn Bindable>) {
        self.resource = Some(resource);
    }

    /// Hand out the resource for linking
    pub fn fetch(&self) -> EngineResult<Arc<dyn Bindable>> {
        self.resource.clone().ok_or_else(|| {
            EngineError::renderer(format!(
                "output '{}' has not been provided with a resource yet",
                self.name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::bindable::{Pipeline, RenderSurface, SurfaceKind};

    #[test]
    fn parses_targets() {
        let t = LinkTarget::parse("lambertian.renderTarget").unwrap();
        assert_eq!(t.pass, "lambertian");
        assert_eq!(t.output, "renderTarget");
        assert!(!t.is_global());
        assert!(LinkTarget::parse("$.backbuffer").unwrap().is_global());
        assert!(LinkTarget::parse("nodot").is_err());
        assert!(LinkTarget::parse(".x").is_err());
        assert!(LinkTarget::parse("a.").is_err());
        assert!(LinkTarget::parse("a.b.c").is_err());
    }

    #[test]
    fn link_checks_concrete_type() {
        let surface: Arc<dyn Bindable> =
            Arc::new(RenderSurface::new("backbuffer", SurfaceKind::Color));
        let pipeline: Arc<dyn Bindable> = Arc::new(Pipeline::new("flat"));

        let mut binder = Binder::new::<RenderSurface>("renderTarget");
        assert!(binder.link(Arc::clone(&pipeline)).is_err());
        assert!(!binder.is_linked());
        binder.link(surface).unwrap();
        assert!(binder.is_linked());
        assert_eq!(
            binder.resource_as::<RenderSurface>().unwrap().name(),
            "backbuffer"
        );
    }

    #[test]
    fn deferred_linker_fails_until_provided() {
        let mut linker = Linker::deferred("buffer");
        assert!(linker.fetch().is_err());
        linker.provide(Arc::new(Pipeline::new("flat")));
        assert!(linker.fetch().is_ok());
    }
}
