//! GPU runtime built on wgpu.
//!
//! Maps to Metal on macOS and Vulkan/DX12 elsewhere. Memory objects live
//! host-side; each dispatch uploads its inputs, runs the generated WGSL,
//! and reads the result back through a staging buffer.

use crate::planner::{GpuBlurPlan, GpuPlanner, GpuReducePlan};
use crate::shaders::{blur_shader_source, min_max_shader_source};
use anyhow::{anyhow, Result};
use bytemuck::{cast_slice, Pod, Zeroable};
use lucid_core::{BackendKind, DeviceInfo, DeviceKind};
use lucid_kernels::config::{gaussian_taps, BlurProblem, ReduceProblem};
use lucid_kernels::error::KernelError;
use lucid_kernels::minmax::MinMax;
use pollster::block_on;
use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use tracing::info;
use wgpu::util::DeviceExt;

/// Whether any usable GPU adapter answers.
pub fn probe() -> bool {
    let instance = wgpu::Instance::default();
    block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .is_some()
}

/// All GPU adapters visible to wgpu, as device descriptors.
pub fn enumerate_devices() -> Vec<DeviceInfo> {
    let instance = wgpu::Instance::default();
    instance
        .enumerate_adapters(wgpu::Backends::all())
        .into_iter()
        .map(|adapter| adapter_device_info(&adapter.get_info()))
        .collect()
}

fn adapter_device_info(info: &wgpu::AdapterInfo) -> DeviceInfo {
    DeviceInfo {
        name: info.name.clone(),
        backend: BackendKind::Gpu,
        kind: match info.device_type {
            wgpu::DeviceType::DiscreteGpu => DeviceKind::DiscreteGpu,
            wgpu::DeviceType::IntegratedGpu => DeviceKind::IntegratedGpu,
            wgpu::DeviceType::VirtualGpu => DeviceKind::VirtualGpu,
            // Software rasterizers score below every real device.
            wgpu::DeviceType::Cpu => DeviceKind::Cpu,
            _ => DeviceKind::OtherGpu,
        },
        driver: format!("{:?}", info.backend),
    }
}

pub struct GpuExecutor {
    planner: GpuPlanner,
    context: GpuContext,
}

impl GpuExecutor {
    pub fn new(planner: GpuPlanner) -> Result<Self> {
        Self::for_device(planner, None)
    }

    /// Bind the executor to a specific adapter by name; falls back to the
    /// high-performance adapter when no name is given.
    pub fn for_device(planner: GpuPlanner, device_name: Option<&str>) -> Result<Self> {
        let context = GpuContext::new(device_name)?;
        Ok(Self { planner, context })
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.context.device_info
    }

    /// Two-pass separable blur over `width * height` f32 samples.
    pub fn execute_blur(&self, problem: BlurProblem, src: &[f32]) -> Result<Vec<f32>> {
        if src.len() != problem.len() {
            return Err(KernelError::mismatch(format!(
                "blur input has {} samples, problem expects {}",
                src.len(),
                problem.len()
            ))
            .into());
        }
        let plan = self.planner.plan_blur(problem)?;
        self.context.run_blur(plan, src)
    }

    /// Stage one on the GPU, pair merge on the host.
    pub fn execute_min_max(&self, problem: ReduceProblem, data: &[f32]) -> Result<MinMax> {
        if data.len() != problem.len {
            return Err(KernelError::mismatch(format!(
                "reduction input has {} elements, problem expects {}",
                data.len(),
                problem.len
            ))
            .into());
        }
        let plan = self.planner.plan_min_max(problem)?;
        self.context.run_min_max(plan, data)
    }
}

struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    device_info: DeviceInfo,
    pipelines: Mutex<HashMap<String, Arc<wgpu::ComputePipeline>>>,
}

impl GpuContext {
    fn new(device_name: Option<&str>) -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = match device_name {
            Some(name) => instance
                .enumerate_adapters(wgpu::Backends::all())
                .into_iter()
                .find(|adapter| adapter.get_info().name == name)
                .ok_or_else(|| anyhow!("no GPU adapter named {name:?}"))?,
            None => block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            }))
            .ok_or_else(|| anyhow!("no suitable GPU adapter found"))?,
        };

        let adapter_info = adapter.get_info();
        let (device, queue) = block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lucid GPU device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))?;

        Ok(Self {
            device,
            queue,
            device_info: adapter_device_info(&adapter_info),
            pipelines: Mutex::new(HashMap::new()),
        })
    }

    fn pipeline_for(&self, label: &str, source: String) -> Result<Arc<wgpu::ComputePipeline>> {
        let mut cache = self
            .pipelines
            .lock()
            .map_err(|_| anyhow!("pipeline cache poisoned"))?;
        if let Some(pipeline) = cache.get(&source) {
            return Ok(Arc::clone(pipeline));
        }

        // Validation errors during compilation land in this scope instead
        // of the device-lost handler.
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.clone().into()),
            });

        let pipeline = Arc::new(self.device.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None,
                module: &shader_module,
                entry_point: "main",
            },
        ));

        if let Some(err) = block_on(self.device.pop_error_scope()) {
            return Err(KernelError::Compile(format!("{label}: {err}")).into());
        }

        cache.insert(source, Arc::clone(&pipeline));
        Ok(pipeline)
    }

    fn run_blur(&self, plan: GpuBlurPlan, src: &[f32]) -> Result<Vec<f32>> {
        let problem = plan.problem;
        let (wg_x, wg_y) = plan.workgroup;
        info!(
            width = problem.width,
            height = problem.height,
            workgroup_x = wg_x,
            workgroup_y = wg_y,
            "gpu blur plan applied"
        );

        let taps_x = gaussian_taps(problem.sigma_x);
        let taps_y = gaussian_taps(problem.sigma_y);

        let src_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("blur_src"),
                contents: cast_slice(src),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let taps_x_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("blur_taps_x"),
                contents: cast_slice(&taps_x),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let taps_y_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("blur_taps_y"),
                contents: cast_slice(&taps_y),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let output_size = (problem.len() * std::mem::size_of::<f32>()) as u64;
        let tmp_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blur_tmp"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        let dst_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blur_dst"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blur_staging"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let horizontal_params = BlurParams {
            width: problem.width as u32,
            height: problem.height as u32,
            radius: (taps_x.len() / 2) as u32,
            horizontal: 1,
        };
        let vertical_params = BlurParams {
            radius: (taps_y.len() / 2) as u32,
            horizontal: 0,
            ..horizontal_params
        };
        let horizontal_params_buffer =
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("blur_params_h"),
                    contents: cast_slice(&[horizontal_params]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
        let vertical_params_buffer =
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("blur_params_v"),
                    contents: cast_slice(&[vertical_params]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });

        let pipeline = self.pipeline_for("blur_pipeline", blur_shader_source(wg_x, wg_y))?;
        let layout = pipeline.get_bind_group_layout(0);

        let horizontal_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur_bind_group_h"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: src_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: taps_x_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: tmp_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: horizontal_params_buffer.as_entire_binding(),
                },
            ],
        });
        let vertical_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur_bind_group_v"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: tmp_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: taps_y_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: dst_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: vertical_params_buffer.as_entire_binding(),
                },
            ],
        });

        let groups_x = (problem.width as u32).div_ceil(wg_x).max(1);
        let groups_y = (problem.height as u32).div_ceil(wg_y).max(1);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("blur_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("blur_pass_h"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &horizontal_bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("blur_pass_v"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &vertical_bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        encoder.copy_buffer_to_buffer(&dst_buffer, 0, &staging_buffer, 0, output_size);
        self.queue.submit(Some(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);

        self.read_back_f32(&staging_buffer)
    }

    fn run_min_max(&self, plan: GpuReducePlan, data: &[f32]) -> Result<MinMax> {
        info!(
            len = plan.problem.len,
            workgroup_size = plan.workgroup_size,
            num_groups = plan.num_groups,
            "gpu min/max plan applied"
        );

        let input_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("min_max_input"),
                contents: cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let partials_size =
            (plan.num_groups as usize * 2 * std::mem::size_of::<f32>()) as u64;
        let partials_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("min_max_partials"),
            size: partials_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("min_max_staging"),
            size: partials_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = ReduceParams {
            len: plan.problem.len as u32,
            stride: plan.num_groups * plan.workgroup_size,
            _pad0: 0,
            _pad1: 0,
        };
        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("min_max_params"),
                contents: cast_slice(&[params]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let pipeline = self.pipeline_for(
            "min_max_pipeline",
            min_max_shader_source(plan.workgroup_size),
        )?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("min_max_bind_group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: partials_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("min_max_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("min_max_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(plan.num_groups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&partials_buffer, 0, &staging_buffer, 0, partials_size);
        self.queue.submit(Some(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);

        let partials = self.read_back_f32(&staging_buffer)?;
        Ok(partials
            .chunks_exact(2)
            .fold(MinMax::IDENTITY, |acc, pair| {
                acc.merge(MinMax {
                    min: pair[0],
                    max: pair[1],
                })
            }))
    }

    fn read_back_f32(&self, staging: &wgpu::Buffer) -> Result<Vec<f32>> {
        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = sender.send(res);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| KernelError::Dispatch("failed to receive GPU map signal".into()))?
            .map_err(|err| KernelError::Dispatch(format!("GPU buffer map failed: {err}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(result)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BlurParams {
    width: u32,
    height: u32,
    radius: u32,
    horizontal: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ReduceParams {
    len: u32,
    stride: u32,
    _pad0: u32,
    _pad1: u32,
}
