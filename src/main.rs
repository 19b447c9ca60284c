use argp::FromArgs;
use tracing_subscriber::EnvFilter;

pub mod argp_version;
pub mod cmd;
pub mod util;

#[derive(FromArgs, PartialEq, Debug)]
/// Qualcomm QCDT master device tree image tools.
struct TopLevel {
    #[argp(subcommand)]
    command: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand)]
enum SubCommand {
    Pack(cmd::pack::Args),
    Unpack(cmd::unpack::Args),
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let args: TopLevel = argp_version::from_env();
    let result = match args.command {
        SubCommand::Pack(c_args) => cmd::pack::run(c_args),
        SubCommand::Unpack(c_args) => cmd::unpack::run(c_args),
    };
    if let Err(e) = result {
        eprintln!("Failed: {e:?}");
        std::process::exit(1);
    }
}
