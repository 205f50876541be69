use clap::Parser;
use std::path::PathBuf;

use wxramp::Backend;

#[derive(Parser)]
#[command(
    name = "wxramp",
    version,
    about = "Apply color ramps to single-band weather rasters"
)]
pub struct CliArgs {
    /// Input raster file or directory of rasters
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory (default: the input's directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Variable name; overrides inference from the filename
    #[arg(short, long)]
    pub variable: Option<String>,

    /// Color ramp / variable catalogue (YAML)
    #[arg(short, long, default_value = "config/variables.yaml")]
    pub config: PathBuf,

    /// Raster backend (gdal or gdal-tools)
    #[arg(long, value_enum, default_value_t = Backend::Gdal)]
    pub backend: Backend,

    /// Timeout in seconds for each external tool invocation (gdal-tools backend)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Tile block size in pixels (0 = striped)
    #[arg(long, default_value_t = 512)]
    pub block_size: usize,

    /// Overview decimation factors, comma separated
    #[arg(long, value_delimiter = ',', default_value = "2,4,8,16")]
    pub overviews: Vec<u32>,

    /// Skip overview generation
    #[arg(long, default_value_t = false)]
    pub no_overviews: bool,

    /// Write the batch report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the catalogue summary and exit
    #[arg(long, default_value_t = false)]
    pub list_variables: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}
