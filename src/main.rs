use clap::{Parser, ValueEnum};
use duplicity_job::job::compiler::JobCompiler;
use duplicity_job::job::config::CompilerConfig;
use duplicity_job::job::result_error::error::Error;
use duplicity_job::job::result_error::result::{convert_error_vec, Result};
use duplicity_job::job::result_error::WithMsg;
use itertools::Itertools;
use std::io::stdout;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Format {
    #[default]
    Yaml,
    Json,
}

/// Compile duplicity backup jobs into scripts and key import actions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file
    #[arg(short, long)]
    config: PathBuf,
    /// Output format of the compiled plan
    #[arg(short, long, value_enum, default_value_t)]
    format: Format,
}

fn fill_host_identifier(config: &mut CompilerConfig) {
    if config.defaults().host_identifier().is_some() {
        return;
    }

    match hostname::get() {
        Ok(host) => {
            let host = host.to_string_lossy().into_owned();
            info!("Using machine hostname {host:?} as default host identifier");
            config.defaults_mut().set_host_identifier(Some(host));
        }
        Err(e) => warn!("Cannot read machine hostname: {e}"),
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = CompilerConfig::load(&args.config)?;
    fill_host_identifier(&mut config);

    let compiler = JobCompiler::new(config.defaults().clone());
    let (compiled, failed): (Vec<_>, Vec<_>) = compiler
        .compile_batch(config.jobs())
        .into_iter()
        .partition_result();

    match args.format {
        Format::Yaml => serde_yml::to_writer(stdout(), &compiled)?,
        Format::Json => serde_json::to_writer_pretty(stdout(), &compiled)?,
    }

    convert_error_vec(failed.into_iter().map(Error::from).collect())
        .with_msg(format!("Some jobs failed to compile: {:?}", &args.config))
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{e}");
        exit(1);
    }
}
