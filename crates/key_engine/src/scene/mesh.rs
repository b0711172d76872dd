//! Drawable meshes

use std::sync::Arc;

use crate::core::{EngineError, EngineResult};
use crate::foundation::math::{Aabb, Transform, Vec3};
use crate::render::bindable::{Bindable, BindableCache, IndexData, VertexData};
use crate::render::graph::{Job, RenderGraph};
use crate::render::vertex::{AttributeKind, VertexBufferData};

use super::camera::Camera;
use super::effect::{Channels, Effect};

/// Geometry with a transform and the effects that draw it
///
/// The vertex and index data live in the bindable cache so meshes built from
/// the same geometry share GPU resources.
pub struct Mesh {
    name: String,
    /// World transform
    pub transform: Transform,
    bounds: Aabb,
    vertex_data: Arc<dyn Bindable>,
    index_data: Arc<dyn Bindable>,
    index_count: u32,
    effects: Vec<Effect>,
    culled: bool,
}

impl Mesh {
    /// Build a mesh from interleaved vertices and triangle indices
    pub fn new(
        name: &str,
        vertices: VertexBufferData,
        indices: Vec<u32>,
        cache: &mut BindableCache,
    ) -> EngineResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(EngineError::renderer(format!(
                "mesh '{name}' index count {} is not a triangle list",
                indices.len()
            )));
        }
        let bounds = local_bounds(&vertices);
        let index_count = indices.len() as u32;

        let vertex_uid = format!("vtx#{name}#{}", vertices.layout().signature());
        let vertex_data = cache.fetch_or_insert(&vertex_uid, || VertexData::new(name, vertices));
        let index_uid = format!("idx#{name}");
        let index_data = cache.fetch_or_insert(&index_uid, || IndexData::new(name, indices));

        Ok(Self {
            name: name.to_string(),
            transform: Transform::identity(),
            bounds,
            vertex_data,
            index_data,
            index_count,
            effects: Vec::new(),
            culled: false,
        })
    }

    /// Mesh name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bounds in mesh-local space
    pub fn local_bounds(&self) -> Aabb {
        self.bounds
    }

    /// Bounds translated to the current world position
    ///
    /// Rotation is ignored; the box is grown nowhere, which is enough for
    /// camera-distance sorting and octree placement.
    pub fn world_bounds(&self) -> Aabb {
        Aabb::new(
            self.bounds.min + self.transform.position,
            self.bounds.max + self.transform.position,
        )
    }

    /// World-space center used for camera-distance sorting
    pub fn world_center(&self) -> Vec3 {
        self.bounds.center() + self.transform.position
    }

    /// Whether the mesh is excluded from rendering
    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Exclude or re-include the mesh in rendering
    pub fn set_culled(&mut self, culled: bool) {
        self.culled = culled;
    }

    /// Attach an effect
    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Attached effects
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Mutable access to the attached effects
    pub fn effects_mut(&mut self) -> &mut [Effect] {
        &mut self.effects
    }

    /// First bindable of type `B` across all effects
    pub fn find_bindable<B: Bindable + 'static>(&self) -> Option<&B> {
        self.effects.iter().find_map(|e| e.find_bindable::<B>())
    }

    /// Submit one job per active effect matching `channels`
    ///
    /// A culled mesh submits nothing.
    pub fn submit(
        &self,
        graph: &mut RenderGraph,
        channels: Channels,
        camera: &Camera,
    ) -> EngineResult<()> {
        if self.culled {
            return Ok(());
        }
        let distance = camera.distance_to(self.world_center());
        for effect in self.effects.iter().filter(|e| e.accepts(channels)) {
            let mut bindables = Vec::with_capacity(2 + effect.bindables().len());
            bindables.push(Arc::clone(&self.vertex_data));
            bindables.push(Arc::clone(&self.index_data));
            bindables.extend(effect.bindables().iter().cloned());
            graph
                .queue_pass(effect.target_pass())?
                .submit(Job::new(bindables, self.index_count, distance));
        }
        Ok(())
    }
}

fn local_bounds(vertices: &VertexBufferData) -> Aabb {
    let mut points = Vec::with_capacity(vertices.vertex_count());
    for i in 0..vertices.vertex_count() {
        if let Some([x, y, z]) = vertices.read::<[f32; 3]>(i, AttributeKind::Position3D) {
            points.push(Vec3::new(x, y, z));
        } else if let Some([x, y]) = vertices.read::<[f32; 2]>(i, AttributeKind::Position2D) {
            points.push(Vec3::new(x, y, 0.0));
        }
    }
    Aabb::from_points(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::bindable::Pipeline;
    use crate::render::graph::{ClearSurfacePass, RenderQueuePass, SortOrder};
    use crate::render::graphics::ClearValue;
    use crate::render::vertex::VertexLayout;

    fn quad_vertices() -> VertexBufferData {
        let mut layout = VertexLayout::new();
        layout.append(AttributeKind::Position3D).unwrap();
        let mut data = VertexBufferData::with_vertices(layout, 4);
        let corners = [
            [-1.0_f32, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
        ];
        for (i, corner) in corners.iter().enumerate() {
            data.write(i, AttributeKind::Position3D, corner);
        }
        data
    }

    fn draw_graph() -> RenderGraph {
        let mut graph = RenderGraph::new();
        let mut clear = Box::new(ClearSurfacePass::new(
            "clearRT",
            ClearValue::Color([0.0; 4]),
        ));
        RenderGraph::set_pass_binder_target(clear.as_mut(), "buffer", "$.backbuffer").unwrap();
        graph.append_pass(clear).unwrap();
        let mut clear_ds = Box::new(ClearSurfacePass::new("clearDS", ClearValue::Depth(1.0)));
        RenderGraph::set_pass_binder_target(clear_ds.as_mut(), "buffer", "$.masterDepth").unwrap();
        graph.append_pass(clear_ds).unwrap();
        let mut queue = Box::new(RenderQueuePass::new("lambertian", SortOrder::FrontToBack));
        RenderGraph::set_pass_binder_target(
            queue.as_mut(),
            RenderQueuePass::RENDER_TARGET,
            "clearRT.buffer",
        )
        .unwrap();
        RenderGraph::set_pass_binder_target(
            queue.as_mut(),
            RenderQueuePass::DEPTH,
            "clearDS.buffer",
        )
        .unwrap();
        graph.append_pass(queue).unwrap();
        graph
    }

    #[test]
    fn bounds_follow_positions_and_transform() {
        let mut cache = BindableCache::new();
        let mut mesh = Mesh::new("quad", quad_vertices(), vec![0, 1, 2, 0, 2, 3], &mut cache)
            .unwrap();
        assert_eq!(mesh.local_bounds().min, Vec3::new(-1.0, -1.0, 0.0));
        mesh.transform.position = Vec3::new(10.0, 0.0, 0.0);
        assert_eq!(mesh.world_center(), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(mesh.world_bounds().max, Vec3::new(11.0, 1.0, 0.0));
    }

    #[test]
    fn non_triangle_index_list_is_rejected() {
        let mut cache = BindableCache::new();
        assert!(Mesh::new("bad", quad_vertices(), vec![0, 1], &mut cache).is_err());
    }

    #[test]
    fn submit_queues_one_job_per_matching_effect() {
        let mut cache = BindableCache::new();
        let mut mesh =
            Mesh::new("quad", quad_vertices(), vec![0, 1, 2, 0, 2, 3], &mut cache).unwrap();
        mesh.add_effect(
            Effect::new("lambertian", Channels::MAIN)
                .with_bindable(Arc::new(Pipeline::new("phong"))),
        );
        mesh.add_effect(Effect::new("lambertian", Channels::SHADOW));

        let mut graph = draw_graph();
        let camera = Camera::default();
        mesh.submit(&mut graph, Channels::MAIN, &camera).unwrap();
        assert_eq!(graph.queue_pass("lambertian").unwrap().job_count(), 1);
    }

    #[test]
    fn culled_mesh_submits_nothing() {
        let mut cache = BindableCache::new();
        let mut mesh =
            Mesh::new("quad", quad_vertices(), vec![0, 1, 2], &mut cache).unwrap();
        mesh.add_effect(Effect::new("lambertian", Channels::MAIN));
        mesh.set_culled(true);

        let mut graph = draw_graph();
        let camera = Camera::default();
        mesh.submit(&mut graph, Channels::MAIN, &camera).unwrap();
        assert_eq!(graph.queue_pass("lambertian").unwrap().job_count(), 0);

        mesh.set_culled(false);
        mesh.submit(&mut graph, Channels::MAIN, &camera).unwrap();
        assert_eq!(graph.queue_pass("lambertian").unwrap().job_count(), 1);
    }

    #[test]
    fn submit_to_unknown_pass_fails() {
        let mut cache = BindableCache::new();
        let mut mesh =
            Mesh::new("quad", quad_vertices(), vec![0, 1, 2], &mut cache).unwrap();
        mesh.add_effect(Effect::new("ghostPass", Channels::MAIN));
        let mut graph = draw_graph();
        let camera = Camera::default();
        assert!(mesh.submit(&mut graph, Channels::MAIN, &camera).is_err());
    }

    #[test]
    fn shared_geometry_uses_one_cache_entry() {
        let mut cache = BindableCache::new();
        let _a = Mesh::new("quad", quad_vertices(), vec![0, 1, 2], &mut cache).unwrap();
        let _b = Mesh::new("quad", quad_vertices(), vec![0, 1, 2], &mut cache).unwrap();
        assert_eq!(cache.instance_count(), 2);
    }
}
