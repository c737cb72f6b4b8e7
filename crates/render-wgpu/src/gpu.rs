use bytemuck::{Pod, Zeroable};
use skyisle_common::{Color, Viewport};
use skyisle_scene::{FirstPersonCamera, SceneDescription, Shape};
use wgpu::util::DeviceExt;

use crate::shaders;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    fog_color: [f32; 4],
    fog_range: [f32; 4],
    hemi_sky: [f32; 4],
    hemi_ground: [f32; 4],
    hemi_up: [f32; 4],
    sun_color: [f32; 4],
    sun_dir: [f32; 4],
}

impl Uniforms {
    fn new(scene: &SceneDescription, camera: &FirstPersonCamera) -> Self {
        let hemi = &scene.hemisphere;
        let sun = &scene.directional;
        let up = hemi.position.normalize_or(glam::Vec3::Y);
        let to_sun = sun.to_light();
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            fog_color: rgba(scene.fog.color, 1.0),
            fog_range: [scene.fog.near, scene.fog.far, 0.0, 0.0],
            hemi_sky: rgba(hemi.sky, hemi.intensity),
            hemi_ground: rgba(hemi.ground, hemi.intensity),
            hemi_up: up.extend(0.0).to_array(),
            sun_color: rgba(sun.color, sun.intensity),
            sun_dir: to_sun.extend(0.0).to_array(),
        }
    }
}

/// Linear color scaled by an intensity, alpha 1.
fn rgba(color: Color, intensity: f32) -> [f32; 4] {
    let [r, g, b] = color.to_linear();
    [r * intensity, g * intensity, b * intensity, 1.0]
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

/// Generate unit cube vertices and indices.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

/// Unit quad in the XY plane, facing +Z.
fn quad_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex { position: [-p, -p, 0.0], normal: n },
        Vertex { position: [p, -p, 0.0], normal: n },
        Vertex { position: [p, p, 0.0], normal: n },
        Vertex { position: [-p, p, 0.0], normal: n },
    ];
    (vertices, vec![0, 1, 2, 2, 3, 0])
}

/// A unit mesh uploaded to the GPU.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, (vertices, indices): (Vec<Vertex>, Vec<u16>)) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// One draw call: which unit mesh, which instance slot, which pipeline.
struct Draw {
    shape: ShapeKind,
    instance: u32,
    double_sided: bool,
}

#[derive(Clone, Copy)]
enum ShapeKind {
    Box,
    Plane,
}

/// Per-scene GPU data. The scene is static, so this is built once.
struct SceneInstances {
    buffer: wgpu::Buffer,
    draws: Vec<Draw>,
}

impl SceneInstances {
    fn build(device: &wgpu::Device, scene: &SceneDescription) -> Self {
        let mut instances = Vec::with_capacity(scene.meshes.len());
        let mut draws = Vec::with_capacity(scene.meshes.len());
        for (i, mesh) in scene.meshes.iter().enumerate() {
            let cols = mesh.model_matrix().to_cols_array_2d();
            instances.push(InstanceData {
                model_0: cols[0],
                model_1: cols[1],
                model_2: cols[2],
                model_3: cols[3],
                color: rgba(mesh.material.color, 1.0),
            });
            draws.push(Draw {
                shape: match mesh.shape {
                    Shape::Box { .. } => ShapeKind::Box,
                    Shape::Plane { .. } => ShapeKind::Plane,
                },
                instance: i as u32,
                double_sided: mesh.material.double_sided,
            });
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("instance_buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        tracing::debug!(meshes = draws.len(), "scene uploaded");
        Self { buffer, draws }
    }
}

/// wgpu-based scene renderer: lit boxes and planes with fog.
pub struct WgpuRenderer {
    culled_pipeline: wgpu::RenderPipeline,
    double_sided_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube: GpuMesh,
    quad: GpuMesh,
    instances: Option<SceneInstances>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let culled_pipeline = mesh_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            Some(wgpu::Face::Back),
            "culled_pipeline",
        );
        let double_sided_pipeline = mesh_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            None,
            "double_sided_pipeline",
        );

        Self {
            culled_pipeline,
            double_sided_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube: GpuMesh::upload(device, "cube", cube_mesh()),
            quad: GpuMesh::upload(device, "quad", quad_mesh()),
            instances: None,
            depth_texture: Self::create_depth_texture(device, viewport),
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, viewport: Viewport) {
        self.depth_texture = Self::create_depth_texture(device, viewport);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Upload the scene's instance data if it has not been uploaded yet.
    pub fn prepare(&mut self, device: &wgpu::Device, scene: &SceneDescription) {
        if self.instances.is_none() {
            self.instances = Some(SceneInstances::build(device, scene));
        }
    }

    /// Render one frame of the scene into `view`.
    ///
    /// Draws nothing but the background until [`prepare`](Self::prepare) has
    /// been called.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &SceneDescription,
        camera: &FirstPersonCamera,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::new(scene, camera)),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(scene.background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(instances) = &self.instances {
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(1, instances.buffer.slice(..));
                for draw in &instances.draws {
                    let pipeline = if draw.double_sided {
                        &self.double_sided_pipeline
                    } else {
                        &self.culled_pipeline
                    };
                    let mesh = match draw.shape {
                        ShapeKind::Box => &self.cube,
                        ShapeKind::Plane => &self.quad,
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                    pass.draw_indexed(0..mesh.index_count, 0, draw.instance..draw.instance + 1);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, viewport: Viewport) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: viewport.width(),
                height: viewport.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// Clear color for an sRGB surface.
pub(crate) fn clear_color(color: Color) -> wgpu::Color {
    let [r, g, b] = color.to_linear();
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: 1.0,
    }
}

fn mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                        6 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<Uniforms>(), 64 + 8 * 16);
    }

    #[test]
    fn unit_meshes_are_well_formed() {
        for (vertices, indices) in [cube_mesh(), quad_mesh()] {
            assert_eq!(indices.len() % 3, 0);
            assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
            for v in &vertices {
                assert!(v.position.iter().all(|c| c.abs() <= 0.5));
            }
        }
    }

    #[test]
    fn quad_winds_counter_clockwise_toward_its_normal() {
        let (v, i) = quad_mesh();
        let a = glam::Vec3::from(v[i[0] as usize].position);
        let b = glam::Vec3::from(v[i[1] as usize].position);
        let c = glam::Vec3::from(v[i[2] as usize].position);
        let face = (b - a).cross(c - a).normalize();
        assert_eq!(face, glam::Vec3::from(v[0].normal));
    }

    #[test]
    fn uniforms_from_scene() {
        let scene = SceneDescription::floating_island();
        let camera = FirstPersonCamera::default();
        let u = Uniforms::new(&scene, &camera);
        assert_eq!(u.camera_pos, [0.0, 10.0, 0.0, 1.0]);
        assert_eq!(u.fog_range[1], 750.0);
        assert_eq!(u.hemi_up, [0.0, 1.0, 0.0, 0.0]);
        // 0.8 intensity on white
        assert!((u.sun_color[0] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn clear_color_is_linear() {
        let c = clear_color(Color::from_hex(0x87CEEB));
        assert!(c.r < 135.0 / 255.0);
        assert_eq!(c.a, 1.0);
    }
}
