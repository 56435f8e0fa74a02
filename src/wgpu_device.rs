//! A [`GraphicsDevice`] backed by wgpu.
//!
//! wgpu has no immediate-mode state machine, so [`WgpuDevice`] records one:
//! program, depth state, matrix uniforms and the bound position buffer are
//! tracked as calls arrive, and each `draw_arrays` snapshots them into a draw
//! command. [`present`](GraphicsDevice::present) turns the recorded commands
//! into a single render pass and shows the frame.
//!
//! # Shader interface
//!
//! Programs are a WGSL vertex module with entry point `vs_main` and a WGSL
//! fragment module with entry point `fs_main`. Names resolve through a fixed
//! table instead of reflection:
//!
//! | name | kind | binding |
//! |------|------|---------|
//! | `position` | attribute | `@location(0)` |
//! | `model_matrix` | uniform | `@group(0) @binding(0)`, field `model` |
//! | `view_matrix` | uniform | `@group(0) @binding(0)`, field `view` |
//! | `proj_matrix` | uniform | `@group(0) @binding(0)`, field `proj` |
//!
//! Vertex data is always `f32`; [`VertexLayout::scalar`] and
//! [`VertexLayout::normalized`] are accepted but not used.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::device::{
    BufferHandle, BufferUsage, ClearFlags, DepthFunc, GraphicsDevice, ProgramHandle,
    ShaderHandle, ShaderStage, Topology, VertexLayout,
};
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::shader::{MODEL_MATRIX, POSITION, PROJ_MATRIX, VIEW_MATRIX};

/// Vertex stage of the built-in program: passes local positions through the
/// model, view and projection matrices.
pub const BASIC_VERTEX_WGSL: &str = include_str!("shaders/basic.vert.wgsl");
/// Fragment stage of the built-in program: colours by local position.
pub const BASIC_FRAGMENT_WGSL: &str = include_str!("shaders/basic.frag.wgsl");
/// Fragment stage for wireframe overlays: flat black.
pub const WIREFRAME_FRAGMENT_WGSL: &str = include_str!("shaders/wireframe.frag.wgsl");

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const UNIFORM_NAMES: [&str; 3] = [MODEL_MATRIX, VIEW_MATRIX, PROJ_MATRIX];
const NO_CLEAR: ClearFlags = ClearFlags {
    color: false,
    depth: false,
};

/// Matrix block bound at group 0, binding 0.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MatrixUniforms {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
}

impl Default for MatrixUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            model: identity,
            view: identity,
            proj: identity,
        }
    }
}

struct ShaderEntry {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
}

struct ProgramEntry {
    vertex: ShaderHandle,
    fragment: ShaderHandle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramHandle,
    topology: Topology,
    depth: Option<DepthFunc>,
    components: u32,
}

struct DrawCommand {
    key: PipelineKey,
    buffer: BufferHandle,
    uniforms: MatrixUniforms,
    first: u32,
    count: u32,
}

struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Renders recorded draws into a window surface.
pub struct WgpuDevice {
    gpu: GpuContext,
    shaders: Vec<ShaderEntry>,
    programs: Vec<ProgramEntry>,
    buffers: Vec<wgpu::Buffer>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_slots: Vec<UniformSlot>,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    recorder: Recorder,
}

/// Immediate-mode state plus the draws recorded since the last present.
struct Recorder {
    program: Option<ProgramHandle>,
    depth: Option<DepthFunc>,
    uniforms: MatrixUniforms,
    position: Option<(BufferHandle, VertexLayout)>,
    viewport: Option<(u32, u32, u32, u32)>,
    clear_color: [f32; 4],
    clear: ClearFlags,
    commands: Vec<DrawCommand>,
}

/// What one present consumes.
struct Frame {
    commands: Vec<DrawCommand>,
    clear: ClearFlags,
    clear_color: [f32; 4],
    viewport: Option<(u32, u32, u32, u32)>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            program: None,
            depth: Some(DepthFunc::default()),
            uniforms: MatrixUniforms::default(),
            position: None,
            viewport: None,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear: NO_CLEAR,
            commands: Vec::new(),
        }
    }
}

impl Recorder {
    fn set_uniform(&mut self, location: u32, value: &Mat4) {
        let value = value.to_cols_array_2d();
        match location {
            0 => self.uniforms.model = value,
            1 => self.uniforms.view = value,
            2 => self.uniforms.proj = value,
            _ => log::warn!("no matrix uniform at location {location}"),
        }
    }

    fn draw(&mut self, topology: Topology, first: u32, count: u32) {
        let (Some(program), Some((buffer, layout))) = (self.program, self.position) else {
            log::warn!("draw without a program and position buffer; skipping");
            return;
        };
        self.commands.push(DrawCommand {
            key: PipelineKey {
                program,
                topology,
                depth: self.depth,
                components: layout.components,
            },
            buffer,
            uniforms: self.uniforms,
            first,
            count,
        });
    }

    /// Hands out the recorded draws and pending clears, leaving the
    /// immediate-mode state in place for the next frame.
    fn take_frame(&mut self) -> Frame {
        Frame {
            commands: std::mem::take(&mut self.commands),
            clear: std::mem::replace(&mut self.clear, NO_CLEAR),
            clear_color: self.clear_color,
            viewport: self.viewport,
        }
    }
}

impl WgpuDevice {
    pub fn new(gpu: GpuContext) -> Self {
        let bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Matrix Bind Group Layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Program Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let depth_view = create_depth_view(&gpu);
        let depth_size = (gpu.width(), gpu.height());

        Self {
            gpu,
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            pipelines: HashMap::new(),
            bind_group_layout,
            pipeline_layout,
            uniform_slots: Vec::new(),
            depth_view,
            depth_size,
            recorder: Recorder::default(),
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Resizes the surface; the depth buffer follows at the next present.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    fn ensure_depth_size(&mut self) {
        let size = (self.gpu.width(), self.gpu.height());
        if self.depth_size != size {
            self.depth_view = create_depth_view(&self.gpu);
            self.depth_size = size;
        }
    }

    fn create_pipeline(&self, key: PipelineKey) -> Result<wgpu::RenderPipeline> {
        let program = self
            .programs
            .get(key.program.index())
            .ok_or_else(|| Error::Device(format!("unknown program {}", key.program.raw())))?;
        let vertex = &self.shaders[program.vertex.index()].module;
        let fragment = &self.shaders[program.fragment.index()].module;

        let attributes = [wgpu::VertexAttribute {
            format: vertex_format(key.components),
            offset: 0,
            shader_location: 0,
        }];

        Ok(self
            .gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Program Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: (key.components.clamp(1, 4) as u64) * 4,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: match key.topology {
                        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
                        Topology::Lines => wgpu::PrimitiveTopology::LineList,
                    },
                    cull_mode: None,
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: key.depth.is_some(),
                    depth_compare: key
                        .depth
                        .map_or(wgpu::CompareFunction::Always, compare_function),
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            }))
    }

    fn uniform_slot(&self) -> UniformSlot {
        let buffer = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Matrix Uniforms"),
            size: std::mem::size_of::<MatrixUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self
            .gpu
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Matrix Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
        UniformSlot { buffer, bind_group }
    }

    /// [`create_pipeline`](Self::create_pipeline) with wgpu validation
    /// panics turned into [`Error::Device`].
    fn build_pipeline(&self, key: PipelineKey) -> Result<wgpu::RenderPipeline> {
        catch_validation(|| self.create_pipeline(key))
    }

    fn submit(&mut self, frame: Frame) -> Result<()> {
        self.ensure_depth_size();

        for command in &frame.commands {
            if !self.pipelines.contains_key(&command.key) {
                let pipeline = self.build_pipeline(command.key)?;
                self.pipelines.insert(command.key, pipeline);
            }
        }
        while self.uniform_slots.len() < frame.commands.len() {
            let slot = self.uniform_slot();
            self.uniform_slots.push(slot);
        }
        for (command, slot) in frame.commands.iter().zip(&self.uniform_slots) {
            self.gpu
                .queue
                .write_buffer(&slot.buffer, 0, bytemuck::bytes_of(&command.uniforms));
        }

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                log::warn!("could not acquire surface texture: {e}");
                self.gpu.reconfigure();
                return Err(Error::Surface(e.to_string()));
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let [r, g, b, a] = frame.clear_color;
            let color_load = if frame.clear.color {
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                })
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if frame.clear.depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some((x, y, width, height)) = frame.viewport {
                let (target_w, target_h) = self.depth_size;
                let width = width.min(target_w.saturating_sub(x));
                let height = height.min(target_h.saturating_sub(y));
                if width > 0 && height > 0 {
                    render_pass.set_viewport(
                        x as f32,
                        y as f32,
                        width as f32,
                        height as f32,
                        0.0,
                        1.0,
                    );
                }
            }

            for (command, slot) in frame.commands.iter().zip(&self.uniform_slots) {
                let (Some(pipeline), Some(buffer)) = (
                    self.pipelines.get(&command.key),
                    self.buffers.get(command.buffer.index()),
                ) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &slot.bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(command.first..command.first + command.count, 0..1);
            }
        }

        log::trace!("submitting {} draws", frame.commands.len());
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl GraphicsDevice for WgpuDevice {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        let device = &self.gpu.device;
        let module = catch_unwind(AssertUnwindSafe(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "Vertex Shader",
                    ShaderStage::Fragment => "Fragment Shader",
                }),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        }))
        .map_err(|payload| Error::ShaderCompile {
            stage,
            log: panic_message(payload),
        })?;

        self.shaders.push(ShaderEntry { stage, module });
        Ok(ShaderHandle::new((self.shaders.len() - 1) as u32))
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle> {
        let stages = (
            self.shaders.get(vertex.index()).map(|s| s.stage),
            self.shaders.get(fragment.index()).map(|s| s.stage),
        );
        if stages != (Some(ShaderStage::Vertex), Some(ShaderStage::Fragment)) {
            return Err(Error::ProgramLink {
                log: "expected a vertex and a fragment shader".to_string(),
            });
        }

        self.programs.push(ProgramEntry { vertex, fragment });
        let program = ProgramHandle::new((self.programs.len() - 1) as u32);

        // Building the default pipeline validates entry points and the
        // interface between the two stages.
        let key = PipelineKey {
            program,
            topology: Topology::Triangles,
            depth: Some(DepthFunc::default()),
            components: 3,
        };
        match self.build_pipeline(key) {
            Ok(pipeline) => {
                self.pipelines.insert(key, pipeline);
                Ok(program)
            }
            Err(e) => {
                self.programs.pop();
                let log = match e {
                    Error::Device(log) => log,
                    other => other.to_string(),
                };
                Err(Error::ProgramLink { log })
            }
        }
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.programs.get(program.index())?;
        (name == POSITION).then_some(0)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.programs.get(program.index())?;
        UNIFORM_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| i as u32)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.recorder.program = Some(program);
    }

    fn set_depth_test(&mut self, func: Option<DepthFunc>) {
        self.recorder.depth = func;
    }

    fn set_uniform_mat4(&mut self, location: u32, value: &Mat4) {
        self.recorder.set_uniform(location, value);
    }

    fn create_buffer(&mut self, data: &[f32], _usage: BufferUsage) -> BufferHandle {
        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        self.buffers.push(buffer);
        BufferHandle::new((self.buffers.len() - 1) as u32)
    }

    fn bind_attribute(&mut self, location: u32, buffer: BufferHandle, layout: VertexLayout) {
        if location == 0 {
            self.recorder.position = Some((buffer, layout));
        }
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) {
        self.recorder.draw(topology, first, count);
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.recorder.viewport = Some((x, y, width, height));
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.recorder.clear_color = color;
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.recorder.clear.color |= flags.color;
        self.recorder.clear.depth |= flags.depth;
    }

    fn viewport_size(&self) -> (u32, u32) {
        (self.gpu.width(), self.gpu.height())
    }

    /// Draws everything recorded since the last present. The recorded draws
    /// are consumed whether or not the frame reaches the screen.
    fn present(&mut self) -> Result<()> {
        let frame = self.recorder.take_frame();
        self.submit(frame)
    }
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        0 | 1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn compare_function(func: DepthFunc) -> wgpu::CompareFunction {
    match func {
        DepthFunc::Never => wgpu::CompareFunction::Never,
        DepthFunc::Less => wgpu::CompareFunction::Less,
        DepthFunc::Equal => wgpu::CompareFunction::Equal,
        DepthFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthFunc::Greater => wgpu::CompareFunction::Greater,
        DepthFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        DepthFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        DepthFunc::Always => wgpu::CompareFunction::Always,
    }
}

/// Runs `f`, converting a wgpu validation panic into [`Error::Device`].
fn catch_validation<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(Error::Device(panic_message(payload))))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "validation failed".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_formats_follow_component_count() {
        assert_eq!(vertex_format(1), wgpu::VertexFormat::Float32);
        assert_eq!(vertex_format(2), wgpu::VertexFormat::Float32x2);
        assert_eq!(vertex_format(3), wgpu::VertexFormat::Float32x3);
        assert_eq!(vertex_format(4), wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn depth_funcs_map_one_to_one() {
        assert_eq!(
            compare_function(DepthFunc::default()),
            wgpu::CompareFunction::LessEqual
        );
        assert_eq!(
            compare_function(DepthFunc::Greater),
            wgpu::CompareFunction::Greater
        );
    }

    #[test]
    fn matrix_block_is_three_mat4s() {
        assert_eq!(std::mem::size_of::<MatrixUniforms>(), 3 * 64);
        let uniforms = MatrixUniforms::default();
        assert_eq!(uniforms.proj, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn panic_payloads_become_logs() {
        let payload = catch_unwind(|| -> u32 { panic!("bad wgsl") }).unwrap_err();
        assert_eq!(panic_message(payload), "bad wgsl");
    }

    #[test]
    fn validation_panics_become_device_errors() {
        let result: Result<u32> = catch_validation(|| panic!("invalid pipeline"));
        assert!(matches!(result, Err(Error::Device(log)) if log == "invalid pipeline"));
        assert_eq!(catch_validation(|| Ok(7)).unwrap(), 7);
    }

    fn recorder_with_position() -> Recorder {
        let mut recorder = Recorder::default();
        recorder.program = Some(ProgramHandle::new(0));
        recorder.position = Some((
            BufferHandle::new(0),
            VertexLayout {
                components: 3,
                scalar: crate::device::ScalarType::Float,
                normalized: false,
            },
        ));
        recorder
    }

    #[test]
    fn draws_need_a_program_and_position() {
        let mut recorder = Recorder::default();
        recorder.draw(Topology::Triangles, 0, 3);
        assert!(recorder.commands.is_empty());

        let mut recorder = recorder_with_position();
        recorder.set_uniform(1, &Mat4::from_translation(glam::Vec3::X));
        recorder.draw(Topology::Lines, 0, 6);
        assert_eq!(recorder.commands.len(), 1);
        let command = &recorder.commands[0];
        assert_eq!(command.key.topology, Topology::Lines);
        assert_eq!(command.uniforms.view[3][0], 1.0);
    }

    #[test]
    fn taking_a_frame_drains_it_even_if_it_is_never_shown() {
        // a frame whose program is unknown to the device fails in submit;
        // its draws must not pile up into the next one
        let mut recorder = recorder_with_position();
        recorder.program = Some(ProgramHandle::new(99));
        recorder.clear = ClearFlags::ALL;
        recorder.draw(Topology::Triangles, 0, 3);
        recorder.draw(Topology::Triangles, 3, 3);

        let failed = recorder.take_frame();
        assert_eq!(failed.commands.len(), 2);
        assert_eq!(failed.clear, ClearFlags::ALL);

        recorder.draw(Topology::Triangles, 0, 3);
        let next = recorder.take_frame();
        assert_eq!(next.commands.len(), 1);
        assert_eq!(next.clear, NO_CLEAR);
        assert_eq!(recorder.program, Some(ProgramHandle::new(99)));
    }

    #[test]
    fn builtin_shaders_use_expected_entry_points() {
        assert!(BASIC_VERTEX_WGSL.contains("fn vs_main"));
        assert!(BASIC_FRAGMENT_WGSL.contains("fn fs_main"));
        assert!(WIREFRAME_FRAGMENT_WGSL.contains("fn fs_main"));
    }
}
