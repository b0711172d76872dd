//! Material descriptions

use std::sync::Arc;

use crate::core::EngineResult;
use crate::render::bindable::{Bindable, BindableCache, ConstantBuffer, Pipeline};
use crate::render::dynamic::{Buffer, ElementType, LayoutCache, RawLayout};

/// Constant slot materials upload into
const MATERIAL_SLOT: u32 = 1;

/// Surface appearance: pipeline plus shading constants
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name, used as the sharing tag
    pub name: String,
    /// Shader pipeline name
    pub pipeline: String,
    /// RGBA base color
    pub color: [f32; 4],
    /// Specular exponent
    pub shininess: f32,
    /// Whether lighting applies
    pub lit: bool,
}

impl Material {
    /// Lit material with the given base color
    pub fn lit(name: &str, pipeline: &str, color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            pipeline: pipeline.to_string(),
            color,
            shininess: 32.0,
            lit: true,
        }
    }

    /// Unlit flat-color material
    pub fn unlit(name: &str, pipeline: &str, color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            pipeline: pipeline.to_string(),
            color,
            shininess: 0.0,
            lit: false,
        }
    }

    /// Build the bindables realizing this material, shared through `cache`
    ///
    /// Produces the pipeline and a constant buffer holding the shading
    /// constants.
    pub fn build_bindables(
        &self,
        layouts: &mut LayoutCache,
        cache: &mut BindableCache,
    ) -> EngineResult<Vec<Arc<dyn Bindable>>> {
        let pipeline_uid = format!("pso#{}", self.pipeline);
        let pipeline_name = self.pipeline.clone();
        let pipeline = cache.fetch_or_insert(&pipeline_uid, || Pipeline::new(&pipeline_name));

        let mut raw = RawLayout::new();
        raw.add(ElementType::Float4, "materialColor")?
            .add(ElementType::Float, "shininess")?
            .add(ElementType::Bool, "lit")?;
        let mut buffer = Buffer::from_raw(layouts, raw)?;
        buffer.set_if_exists("materialColor", &self.color);
        buffer.set_if_exists("shininess", &self.shininess);
        buffer.set_if_exists("lit", &self.lit);

        let cbuf_uid = format!("cbuf#{}#{MATERIAL_SLOT}#{}", self.name, buffer.signature());
        let name = self.name.clone();
        let cbuf =
            cache.fetch_or_insert(&cbuf_uid, move || ConstantBuffer::new(&name, MATERIAL_SLOT, buffer));

        Ok(vec![pipeline, cbuf])
    }
}
