use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use argp::FromArgs;
use tracing::{info, warn};

use crate::util::{
    chip_id::{QcdtVersion, QCDT_DT_TAG},
    dtc::{Decompiler, Dtc},
    file::{buf_writer, find_dtbs},
    pack::{PackContext, PackOptions, DEFAULT_PAGE_SIZE},
    qcdt::write_qcdt,
};

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// Creates a QCDT master DTB image from a directory of DTBs.
#[argp(subcommand, name = "pack")]
pub struct Args {
    #[argp(positional)]
    /// input directory (searched recursively for .dtb files)
    input_dir: PathBuf,
    #[argp(option, short = 'o')]
    /// output file
    output: PathBuf,
    #[argp(option, short = 'p')]
    /// directory containing dtc (default: search PATH)
    dtc_path: Option<PathBuf>,
    #[argp(option, short = 's', default = "DEFAULT_PAGE_SIZE")]
    /// page size in bytes
    page_size: u32,
    #[argp(option, short = 'd', default = "QCDT_DT_TAG.to_string()")]
    /// alternate chipset tag
    dt_tag: String,
    #[argp(switch, short = '2')]
    /// output dtb v2 format
    force_v2: bool,
    #[argp(switch, short = '3')]
    /// output dtb v3 format
    force_v3: bool,
}

impl Args {
    fn options(&self) -> Result<PackOptions> {
        ensure!(
            !(self.force_v2 && self.force_v3),
            "A version output argument may only be passed once"
        );
        let force_version = if self.force_v2 {
            Some(QcdtVersion::V2)
        } else if self.force_v3 {
            Some(QcdtVersion::V3)
        } else {
            None
        };
        let options =
            PackOptions { page_size: self.page_size, dt_tag: self.dt_tag.clone(), force_version };
        options.validate()?;
        Ok(options)
    }
}

pub fn run(args: Args) -> Result<()> {
    let options = args.options()?;
    info!("DTB combiner:");
    info!("  Input directory: {}", args.input_dir.display());
    info!("  Output file: {}", args.output.display());

    let mut ctx = PackContext::new();
    let count = scan_dir(&mut ctx, &args.input_dir, &Dtc::new(args.dtc_path.clone()), &options)?;
    info!("=> Found {} unique DTB(s)", count);
    if count == 0 {
        warn!("No chip entries found, '{}' not written", args.output.display());
        return Ok(());
    }

    info!("Generating master DTB...");
    let mut out = buf_writer(&args.output)?;
    write_qcdt(&mut out, &mut ctx, &options, |path| {
        fs::read(path).with_context(|| format!("Failed to read DTB '{}'", path.display()))
    })
    .with_context(|| format!("Failed to write '{}'", args.output.display()))?;
    info!("Done");
    Ok(())
}

/// Scans every DTB under `dir`. Returns the number of unique chip entries added.
fn scan_dir(
    ctx: &mut PackContext,
    dir: &Path,
    decompiler: &dyn Decompiler,
    options: &PackOptions,
) -> Result<usize> {
    let mut count = 0;
    for path in find_dtbs(dir)? {
        info!("Found file: {} ...", path.display());
        count += ctx.scan_dtb(&path, decompiler, options)?;
    }
    Ok(count)
}
