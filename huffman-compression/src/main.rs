use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use huffman_compression::{compress, decompress, CompressionStats, Payload};
use log::info;

/// Static Huffman compressor.
///
/// With two paths, compresses INPUT into OUTPUT. With one path, restores the
/// compressed file under the name it was compressed from.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// `INPUT OUTPUT` to compress, `COMPRESSED` to decompress
    #[arg(required = true, num_args = 1..=2, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();
    let started = Instant::now();

    match args.paths.as_slice() {
        [input, output] => compress_file(input, output)?,
        [compressed] => decompress_file(compressed)?,
        paths => bail!("expected one or two paths, got {}", paths.len()),
    }

    println!("Elapsed time: {} ms", started.elapsed().as_millis());
    Ok(())
}

fn compress_file(input: &Path, output: &Path) -> anyhow::Result<()> {
    let content =
        fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let file_name = input
        .to_str()
        .with_context(|| format!("{} is not a valid UTF-8 path", input.display()))?;

    let payload = compress(&content, file_name)
        .with_context(|| format!("failed to compress {}", input.display()))?;

    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?,
    );
    payload.write_to(&mut writer)?;
    writer.flush()?;

    let stats = CompressionStats::of(&content, &payload);
    info!(
        "compressed {} into {} with {} codes",
        input.display(),
        output.display(),
        payload.table().len()
    );
    println!("Compression: {stats}");
    Ok(())
}

fn decompress_file(compressed: &Path) -> anyhow::Result<()> {
    let file =
        File::open(compressed).with_context(|| format!("failed to open {}", compressed.display()))?;
    let payload = Payload::read_from(&mut BufReader::new(file))
        .with_context(|| format!("failed to read {}", compressed.display()))?;

    let content = decompress(&payload)
        .with_context(|| format!("failed to decompress {}", compressed.display()))?;

    let output = Path::new(payload.file_name());
    fs::write(output, &content).with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        "restored {} bytes from {} into {}",
        content.len(),
        compressed.display(),
        output.display()
    );
    Ok(())
}
