use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wxramp::{
    Backend, BatchRunner, ColorizeParams, GdalBackend, GdalToolsBackend, RampConfig,
    RasterBackend,
};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn run(args: CliArgs) -> Result<(), AppError> {
    init_logging(args.verbose);

    let config = match RampConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    info!("Loaded configuration from {:?}", args.config);

    if args.list_variables {
        println!("{}", config.summary());
        return Ok(());
    }

    let input = args.input.ok_or(AppError::MissingArgument {
        arg: "--input".to_string(),
    })?;

    let gdal_backend = GdalBackend;
    let tools_backend =
        GdalToolsBackend::default().with_timeout(args.timeout.map(Duration::from_secs));
    let backend: &dyn RasterBackend = match args.backend {
        Backend::Gdal => &gdal_backend,
        Backend::GdalTools => &tools_backend,
    };

    let params = ColorizeParams {
        block_size: args.block_size,
        overview_factors: if args.no_overviews {
            Vec::new()
        } else {
            args.overviews.clone()
        },
        ..Default::default()
    };

    let runner = BatchRunner::new(&config, backend).with_params(params);
    let report = runner.run(&input, args.output.as_deref(), args.variable.as_deref())?;

    if report.attempted == 0 {
        return Err(AppError::NoInputs {
            path: input.display().to_string(),
        });
    }

    report.log_summary();
    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)?;
        info!("Report written to {:?}", path);
    }

    if !report.is_success() {
        return Err(AppError::BatchFailed {
            failed: report.failed,
            attempted: report.attempted,
        });
    }
    Ok(())
}
