use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use romdump::bus::{ImageBus, ReadBus, read_image};
use romdump::config::Config;
use romdump::dump::{
    DumpOutcome, DumpPolicy, first_nonempty, write_dump,
    write_dump_with_policy,
};
use romdump::hex::{HexCase, HexFormat, LineEnding, assemble, parse_records};
use romdump::line::{LineDriver, SimLines, SysfsLines};
use romdump::rom::{ROM_SIZE, Upd2764};
use romdump::verify::Verification;
use romdump::view::format_hex_view;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

//===========================================================================//

#[derive(Parser)]
#[clap(author, about, long_about = None, version)]
struct Cli {
    /// The TOML configuration file to use instead of the defaults.
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// Logs more detail to stderr (repeat for more).  Ignored if RUST_LOG is
    /// set.
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dumps the whole device as Intel HEX.
    Dump {
        #[clap(flatten)]
        source: SourceArgs,
        /// The file to write, or none for stdout.
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// Writes nothing at all if every byte of the device is blank.
        #[clap(long)]
        skip_blank: bool,
        #[clap(flatten)]
        format: FormatArgs,
    },
    /// Finds the first non-blank byte of the device.
    Scan {
        #[clap(flatten)]
        source: SourceArgs,
    },
    /// Reads the device and compares it against a HEX file.
    Verify {
        /// The HEX file holding the expected contents.
        hex: PathBuf,
        #[clap(flatten)]
        source: SourceArgs,
    },
    /// Encodes a raw binary image as Intel HEX, as a dump of a device holding
    /// it would.
    Encode {
        /// The raw image; its size must be a power of two, at most 8kB.
        binary: PathBuf,
        /// The file to write, or none for stdout.
        #[clap(short, long)]
        output: Option<PathBuf>,
        #[clap(flatten)]
        format: FormatArgs,
    },
    /// Displays the contents of a HEX file.
    View {
        /// The HEX file to display.
        hex: PathBuf,
    },
    /// Prints the effective configuration as TOML.
    Config,
}

#[derive(Args)]
struct SourceArgs {
    /// Reads a simulated chip holding this raw image instead of hardware.
    #[clap(long)]
    image: Option<PathBuf>,
    /// The root of the sysfs GPIO tree.
    #[clap(long, default_value = SysfsLines::DEFAULT_ROOT)]
    gpio_root: PathBuf,
}

#[derive(Args)]
struct FormatArgs {
    /// Writes hex digits in lowercase.
    #[clap(long)]
    lowercase: bool,
    /// Ends lines with LF rather than CRLF.
    #[clap(long)]
    lf: bool,
}

impl FormatArgs {
    fn hex_format(&self) -> HexFormat {
        let case =
            if self.lowercase { HexCase::Lower } else { HexCase::Upper };
        let line_ending =
            if self.lf { LineEnding::Lf } else { LineEnding::CrLf };
        HexFormat { case, line_ending }
    }
}

//===========================================================================//

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    match cli.command {
        Command::Dump { source, output, skip_blank, format } => {
            let mut rom = open_device(&source, &config)?;
            let mut writer = create_output(output.as_deref());
            let policy = if skip_blank {
                DumpPolicy::SkipBlank
            } else {
                DumpPolicy::Always
            };
            let outcome = write_dump_with_policy(
                &mut rom,
                &mut writer,
                format.hex_format(),
                policy,
            )
            .context("writing dump")?;
            if outcome == DumpOutcome::SkippedBlank {
                eprintln!("{} is blank; nothing written", rom.description());
            }
        }
        Command::Scan { source } => {
            let mut rom = open_device(&source, &config)?;
            let addr = first_nonempty(&mut rom);
            if addr == ROM_SIZE {
                println!("{} is blank", rom.description());
            } else {
                println!("first non-blank byte at ${addr:04x}");
            }
        }
        Command::Verify { hex, source } => {
            let expected = read_hex_file(&hex)?;
            let mut rom = open_device(&source, &config)?;
            let actual = read_image(&mut rom).context("reading device")?;
            let verification = Verification::new(&actual, &expected);
            println!("{verification}");
            if !verification.is_match() {
                let description = rom.description();
                bail!("{} does not match {}", description, hex.display());
            }
        }
        Command::Encode { binary, output, format } => {
            let image = fs::read(&binary)
                .with_context(|| format!("reading {}", binary.display()))?;
            if image.is_empty()
                || image.len() > usize::from(ROM_SIZE)
                || !image.len().is_power_of_two()
            {
                bail!(
                    "{} is {} bytes; expected a power of two up to {}",
                    binary.display(),
                    image.len(),
                    ROM_SIZE
                );
            }
            let mut bus = ImageBus::new(image.into_boxed_slice());
            let mut writer = create_output(output.as_deref());
            write_dump(&mut bus, &mut writer, format.hex_format())
                .context("writing dump")?;
        }
        Command::View { hex } => {
            let image = read_hex_file(&hex)?;
            print!("{}", format_hex_view(&image));
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

//===========================================================================//

/// An output file that is only created (and truncated) by the first write,
/// so that a command which ends up writing nothing leaves any existing file
/// untouched.
struct DeferredFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl DeferredFile {
    fn new(path: &Path) -> DeferredFile {
        DeferredFile { path: path.to_path_buf(), writer: None }
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let file = File::create(&self.path).map_err(|error| {
                    let path = self.path.display();
                    io::Error::new(error.kind(), format!("{path}: {error}"))
                })?;
                BufWriter::new(file)
            }
        };
        Ok(self.writer.insert(writer))
    }
}

impl Write for DeferredFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

//===========================================================================//

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("romdump={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn open_device(
    source: &SourceArgs,
    config: &Config,
) -> anyhow::Result<Upd2764<Box<dyn LineDriver>>> {
    let lines: Box<dyn LineDriver> = match &source.image {
        Some(path) => {
            let image = fs::read(path)
                .with_context(|| format!("reading {}", path.display()))?;
            if image.is_empty() {
                bail!("{} is empty", path.display());
            }
            Box::new(SimLines::new(
                config.wiring.clone(),
                image.into_boxed_slice(),
            ))
        }
        None => Box::new(SysfsLines::new(&source.gpio_root)),
    };
    let mut rom = Upd2764::new(lines, config.wiring.clone())
        .with_timing(config.timing);
    rom.initialize()
        .with_context(|| format!("initializing {}", rom.description()))?;
    Ok(rom)
}

fn create_output(path: Option<&Path>) -> Box<dyn Write> {
    match path {
        Some(path) => Box::new(DeferredFile::new(path)),
        None => Box::new(io::stdout().lock()),
    }
}

fn read_hex_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let records = parse_records(&source).map_err(|errors| {
        let messages: Vec<String> =
            errors.iter().map(ToString::to_string).collect();
        anyhow!("{}: {}", path.display(), messages.join("; "))
    })?;
    Ok(assemble(&records))
}

//===========================================================================//
