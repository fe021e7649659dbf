//! CLI wiring for the lucid toolkit.

use crate::backend::{Backend, Lucid};
use crate::executor::KernelExecutor;
use anyhow::Result;
use clap::{Parser, Subcommand};
use lucid_core::{BackendKind, NativeType};
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lucid", about = "lucid compute toolkit")]
pub struct Cli {
    #[arg(long, value_enum, default_value = "best")]
    pub backend: BackendArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum BackendArg {
    Best,
    Cpu,
    Gpu,
}

impl From<BackendArg> for Backend {
    fn from(value: BackendArg) -> Backend {
        match value {
            BackendArg::Best => Backend::best(),
            BackendArg::Cpu => Backend::cpu(),
            BackendArg::Gpu => Backend::gpu(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List visible compute devices as JSON.
    Devices,
    /// Blur a synthetic image and report timing.
    Blur {
        #[arg(long, default_value_t = 1024)]
        width: usize,
        #[arg(long, default_value_t = 1024)]
        height: usize,
        #[arg(long, default_value_t = 4.0)]
        sigma: f32,
        #[arg(long)]
        sigma_y: Option<f32>,
    },
    /// Run a min/max reduction over synthetic data and report timing.
    MinMaxBench {
        #[arg(long, default_value_t = 2048 * 2048 + 1)]
        len: usize,
        #[arg(long, default_value_t = 128)]
        work_group_size: usize,
    },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let Cli { backend, command } = cli;
    let lucid = Lucid::new(backend.into());

    match command {
        Command::Devices => {
            let infos: Vec<_> = lucid
                .devices()
                .into_iter()
                .map(|device| device.info().clone())
                .collect();
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
        Command::Blur {
            width,
            height,
            sigma,
            sigma_y,
        } => {
            let device = lucid.best_gpu_device();
            let context = device.create_context()?;
            let executor = KernelExecutor::new(&context)?;

            let mut src = executor.create_buffer(&[width, height], NativeType::U16)?;
            let ramp: Vec<u16> = (0..width * height).map(|i| (i % 4096) as u16).collect();
            src.fill_from(&ramp)?;
            let mut dst = executor.create_buffer_like(&src)?;

            let start = Instant::now();
            executor.blur(&src, &mut dst, sigma, sigma_y.unwrap_or(sigma))?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            info!(
                device = device.name(),
                backend = %context.backend_kind(),
                elapsed_ms,
                "blur complete"
            );
            println!("blur {width}x{height} sigma={sigma}: {elapsed_ms:.2} ms");

            executor.close();
            context.close();
        }
        Command::MinMaxBench {
            len,
            work_group_size,
        } => {
            let device = lucid.best_gpu_device();
            let context = device.create_context()?;
            let executor = KernelExecutor::new(&context)?;

            let mut buffer = executor.create_buffer(&[len], NativeType::F32)?;
            let values: Vec<f32> = (0..len).map(|i| 1.0 / (1.0 + i as f32)).collect();
            buffer.fill_from(&values)?;

            let start = Instant::now();
            let [min, max] = executor.min_max(&buffer, work_group_size)?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            println!(
                "min/max over {len} elements (workgroup {work_group_size}): \
                 min={min} max={max} in {elapsed_ms:.2} ms"
            );

            executor.close();
            context.close();
        }
    }

    if lucid.backend().kind() == BackendKind::Gpu {
        info!("gpu backend session finished");
    }
    Ok(())
}
