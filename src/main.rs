//! Command-line front end for splitting FSB5 sound banks.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use fsbsplit::{Bank, DescriptorWidth, Sample};
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Seek, Write},
    path::{Path, PathBuf},
    process,
};

#[derive(Debug, Parser)]
#[command(
    name = "fsbsplit",
    version,
    about = "Split FSB5 sound banks into standalone single-sample banks"
)]
struct Cli {
    /// Bank file to split.
    bank: Option<PathBuf>,

    /// Directory for the split banks; created if missing.
    /// Defaults to a directory named after the bank file.
    output: Option<PathBuf>,

    /// Width of the bank's directory descriptors in bits.
    #[arg(long, value_enum, default_value_t = WidthArg::U64)]
    descriptor_width: WidthArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WidthArg {
    #[value(name = "64")]
    U64,
    #[value(name = "32")]
    U32,
}

impl From<WidthArg> for DescriptorWidth {
    fn from(value: WidthArg) -> Self {
        match value {
            WidthArg::U64 => Self::U64,
            WidthArg::U32 => Self::U32,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(bank_path) = cli.bank else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let file = File::open(&bank_path)
        .with_context(|| format!("failed to open {}", bank_path.display()))?;

    let bank = Bank::with_descriptor_width(BufReader::new(file), cli.descriptor_width.into())
        .with_context(|| format!("failed to parse {}", bank_path.display()))?;

    let base = bank_path
        .file_stem()
        .context("bank path has no file name")?
        .to_string_lossy()
        .into_owned();

    let out_dir = match cli.output {
        Some(dir) => dir,
        None => bank_path.with_file_name(&base),
    };

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let count = bank.sample_count();

    bank.process_samples(|sample| write_split_bank(&out_dir, &base, sample))
        .map_err(|(e, index)| e.context(format!("failed to split sample at index {index}")))?;

    println!("split {count} samples into {}", out_dir.display());

    Ok(())
}

fn write_split_bank<R: Read + Seek>(dir: &Path, base: &str, sample: Sample<'_, R>) -> Result<()> {
    let name = match sample.name() {
        Some(name) if !name.is_empty() => sanitize(name),
        _ => format!("{:08X}", sample.index()),
    };

    let file_name = format!("{base}_{name}.fsb");
    let path = dir.join(&file_name);
    let expected = u64::from(sample.size());

    print!("processing {file_name} ...");
    io::stdout().flush()?;

    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut sink = BufWriter::new(file);

    let copied = sample.write(&mut sink)?;
    sink.flush()?;

    if copied == expected {
        println!(" done");
    } else {
        println!(" done ({copied} of {expected} payload bytes copied)");
    }

    Ok(())
}

// Shipped banks carry project paths as sample names, so path separators and
// drive colons are replaced before use as a file name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}
