//! Rendering effects
//!
//! An effect is one way of drawing a mesh: the bindables to apply and the
//! queue pass that draws them. A mesh typically carries several effects
//! (lit, shadow-casting, wireframe) and the frame's active channels decide
//! which of them submit jobs.

use std::sync::Arc;

use bitflags::bitflags;

use crate::render::bindable::Bindable;

bitflags! {
    /// Rendering channels an effect participates in
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Channels: u32 {
        /// Main color rendering
        const MAIN = 1;
        /// Shadow map rendering
        const SHADOW = 1 << 1;
        /// Debug wireframe rendering
        const WIREFRAME = 1 << 2;
    }
}

/// One drawing technique of a mesh
pub struct Effect {
    target_pass: String,
    channels: Channels,
    bindables: Vec<Arc<dyn Bindable>>,
    active: bool,
}

impl Effect {
    /// Create an active effect submitting to `target_pass`
    pub fn new(target_pass: &str, channels: Channels) -> Self {
        Self {
            target_pass: target_pass.to_string(),
            channels,
            bindables: Vec::new(),
            active: true,
        }
    }

    /// Attach a bindable; chainable
    pub fn with_bindable(mut self, bindable: Arc<dyn Bindable>) -> Self {
        self.bindables.push(bindable);
        self
    }

    /// Attach a bindable
    pub fn add_bindable(&mut self, bindable: Arc<dyn Bindable>) {
        self.bindables.push(bindable);
    }

    /// Queue pass this effect submits to
    pub fn target_pass(&self) -> &str {
        &self.target_pass
    }

    /// Channels this effect participates in
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Enable or disable the effect
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether the effect submits jobs
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the effect participates in any of `channels`
    pub fn accepts(&self, channels: Channels) -> bool {
        self.active && self.channels.intersects(channels)
    }

    /// Attached bindables in bind order
    pub fn bindables(&self) -> &[Arc<dyn Bindable>] {
        &self.bindables
    }

    /// First attached bindable of concrete type `B`
    pub fn find_bindable<B: Bindable + 'static>(&self) -> Option<&B> {
        self.bindables
            .iter()
            .find_map(|b| b.as_any().downcast_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::bindable::Pipeline;

    #[test]
    fn channel_filtering() {
        let mut effect = Effect::new("lambertian", Channels::MAIN | Channels::WIREFRAME);
        assert!(effect.accepts(Channels::MAIN));
        assert!(!effect.accepts(Channels::SHADOW));
        effect.set_active(false);
        assert!(!effect.accepts(Channels::MAIN));
    }

    #[test]
    fn find_bindable_downcasts() {
        let effect = Effect::new("lambertian", Channels::MAIN)
            .with_bindable(Arc::new(Pipeline::new("flat")));
        assert_eq!(effect.find_bindable::<Pipeline>().unwrap().name(), "flat");
        assert!(effect
            .find_bindable::<crate::render::bindable::RenderSurface>()
            .is_none());
    }
}
