use replay::catalog::{DEFAULT_MANIFEST_PATH, ManifestSource};

#[derive(Debug, Default)]
struct CliArgs {
    manifest: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let manifest =
        ManifestSource::parse(args.manifest.as_deref().unwrap_or(DEFAULT_MANIFEST_PATH))?;
    replay::app::run(replay::app::AppOptions { manifest })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--manifest" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--manifest requires a path or http url");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--manifest cannot be empty");
                }
                out.manifest = Some(value.trim().to_string());
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("Replay");
    println!("  --manifest <path|url>   Track manifest (default: {DEFAULT_MANIFEST_PATH})");
}
