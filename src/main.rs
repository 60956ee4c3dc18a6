use clap::{Parser, ValueEnum};
use glob::glob;
use log::{error, info, LevelFilter};
use rgb565conv::{ColorFormat, ConvertOptions, Converter, HeaderWriter, Logger, Resize, SourceFormat};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Rgb565,
    Argb8565,
}

impl From<FormatArg> for ColorFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Rgb565 => ColorFormat::Rgb565,
            FormatArg::Argb8565 => ColorFormat::Argb8565,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "rgb565conv", about = "Convert images into C arrays of RGB565 or ARGB8565 pixels")]
struct Cli {
    #[arg(required = true, help = "Image file or glob pattern (BMP 1/4/8/24/32 bpp, PNG, JPEG, ...)")]
    path: String,

    #[arg(short, long, value_enum, help = "Output color format [default: rgb565 for BMP, argb8565 otherwise]")]
    format: Option<FormatArg>,

    #[arg(short = 'o', long = "output-dir", help = "Output directory for generated headers")]
    output_dir: Option<String>,

    #[arg(short = 'n', long = "name", help = "Name of the generated array (single input only)")]
    name: Option<String>,

    #[arg(short = 's', long = "scale", conflicts_with = "resize", help = "Scale factor to apply to the image")]
    scale: Option<f64>,

    #[arg(
        short = 'r',
        long = "resize",
        num_args = 2,
        value_names = ["WIDTH", "HEIGHT"],
        help = "Resize the image to the given dimensions"
    )]
    resize: Option<Vec<u32>>,

    #[arg(short = 'S', long = "save", help = "Save the resized image to this path (single input only)")]
    save: Option<PathBuf>,

    #[arg(long, help = "Print the BMP headers instead of converting")]
    info: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

impl Cli {
    fn resize(&self) -> Option<Resize> {
        match (&self.scale, &self.resize) {
            (Some(factor), _) => Some(Resize::Scale(*factor)),
            (None, Some(dims)) if dims.len() == 2 => Some(Resize::Exact(dims[0], dims[1])),
            _ => None,
        }
    }

    fn options(&self) -> ConvertOptions {
        ConvertOptions {
            format: self.format.map(ColorFormat::from),
            resize: self.resize(),
            save_resized: self.save.clone(),
        }
    }
}

fn get_files(path: &str) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let absolute_pattern = if Path::new(path).is_relative() {
        base_dir.join(path).to_string_lossy().into_owned()
    } else {
        path.to_string()
    };

    for entry in glob(&absolute_pattern)? {
        match entry {
            Ok(path) => {
                if !path.is_file() {
                    continue;
                }

                files.push(path);
            }
            Err(e) => error!("{}", e),
        }
    }

    Ok(files)
}

fn get_output_path(file: &Path, output_dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file_stem = file
        .file_stem()
        .ok_or("Invalid file name")?
        .to_str()
        .ok_or("Invalid file stem")?;

    let output_path = if let Some(dir) = output_dir {
        let output_dir = Path::new(dir);

        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        output_dir.join(format!("{}.h", file_stem))
    } else {
        // Next to the input file
        file.parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{}.h", file_stem))
    };

    Ok(output_path)
}

fn process_file(file: &Path, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut converter = Converter::open(file)?;

    if cli.info {
        let info = converter.bmp_info()?;
        println!("File: {}", file.display());
        print!("{}", info);
        return Ok(());
    }

    let options = cli.options();
    let image = converter.decode(&options)?;

    let output_path = get_output_path(file, cli.output_dir.as_deref())?;
    let name = match &cli.name {
        Some(name) => name.clone(),
        None => file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    HeaderWriter::write_file(&output_path, &image, &name)?;

    let source = match converter.source_format() {
        SourceFormat::Bmp => match converter.bmp_info() {
            Ok(info) => format!("BMP {} bpp", info.info_header.bits_per_pixel),
            Err(_) => "BMP".to_string(),
        },
        other => format!("{:?}", other),
    };

    info!(
        "{}: {} as {:?} {}x{} -> {}",
        file.display(),
        source,
        image.color_format(),
        image.width(),
        image.height(),
        output_path.display()
    );

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    if let Err(e) = Logger::init(level) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let files = match get_files(&cli.path) {
        Ok(files) => files,
        Err(e) => {
            error!("Invalid input pattern {}: {}", cli.path, e);
            return ExitCode::FAILURE;
        }
    };

    if files.is_empty() {
        error!("No files match {}", cli.path);
        return ExitCode::FAILURE;
    }

    if files.len() > 1 && (cli.name.is_some() || cli.save.is_some()) {
        error!("--name and --save need exactly one input file, {} matched", files.len());
        return ExitCode::FAILURE;
    }

    let mut failed = 0;
    for file in &files {
        if let Err(e) = process_file(file, &cli) {
            error!("{}: {}", file.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        error!("{} of {} files failed", failed, files.len());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
