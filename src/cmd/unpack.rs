use std::{fs::DirBuilder, path::PathBuf};

use anyhow::{Context, Result};
use argp::FromArgs;
use tracing::info;

use crate::util::{
    chip_id::{ChipId, QcdtVersion},
    file::map_file,
    qcdt::{extract_qcdt, QcdtView},
};

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// Lists or extracts the DTBs in a QCDT image.
#[argp(subcommand, name = "unpack")]
pub struct Args {
    #[argp(positional)]
    /// QCDT image
    file: PathBuf,
    #[argp(option, short = 'o', default = "PathBuf::from(\"out\")")]
    /// output directory
    out: PathBuf,
    #[argp(switch, short = 'p')]
    /// only print the structure without extracting DTBs
    print_only: bool,
}

pub fn run(args: Args) -> Result<()> {
    let file = map_file(&args.file)?;
    let view = QcdtView::new(&file)
        .with_context(|| format!("Failed to open QCDT file '{}'", args.file.display()))?;
    print_table(&view);
    if args.print_only {
        return Ok(());
    }

    DirBuilder::new()
        .recursive(true)
        .create(&args.out)
        .with_context(|| format!("Failed to create directory '{}'", args.out.display()))?;
    let written = extract_qcdt(&view, &args.out)?;
    info!("Extracted {} DTB(s) to '{}'", written.len(), args.out.display());
    Ok(())
}

fn print_table(view: &QcdtView) {
    println!("QCDT magic: {}", view.magic());
    println!("version: {}", view.version);
    println!("dtb_count: {}", view.header.entry_count.get());
    for (i, entry) in view.entries.iter().enumerate() {
        println!();
        println!("Chip {}:", i + 1);
        let id = &entry.id;
        if view.version >= QcdtVersion::V2 {
            println!(
                " chipset: {} platform: {} subtype: {} revNum: {}",
                id.chipset(),
                id.platform(),
                id.subtype(),
                id.revision()
            );
        } else {
            println!(
                " chipset: {} platform: {} revNum: {}",
                id.chipset(),
                id.platform(),
                id.revision()
            );
        }
        if let ChipId::V3 { pmic, .. } = id {
            let [p0, p1, p2, p3] = pmic;
            println!(" pmic0: {} pmic1: {} pmic2: {} pmic3: {}", p0, p1, p2, p3);
        }
        println!(" dtb offset: {} dtb size: {}", entry.dtb_offset, entry.dtb_size);
    }
    println!();
}
