use anyhow::Context;
use log::debug;
use tsstring::cli::{self, CliArgs, CliCommand};
use tsstring::config::{self, CodecConfig};
use tsstring::dump::StringDump;
use tsstring::ws::WsRegistry;
use tsstring::xml;

fn load_config(args: &CliArgs) -> anyhow::Result<CodecConfig> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => config::find_config_file(),
    };
    match path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            CodecConfig::from_file(&path).map_err(anyhow::Error::msg)
        }
        None => Ok(CodecConfig::default()),
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut config = load_config(&args)?;
    if args.no_indent {
        config.indent = false;
    }
    let registry: WsRegistry = config.registry();
    for id in &args.writing_systems {
        registry.register(id)?;
    }

    let file = args.command.file();
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let tss = xml::decode(&input, &registry)
        .with_context(|| format!("Failed to decode {}", file.display()))?;
    debug!("Decoded {} chars in {} runs", tss.len(), tss.run_count());

    match &args.command {
        CliCommand::Roundtrip { .. } => {
            let opts = config.encode_options(&registry);
            println!("{}", xml::encode_with(&tss, &registry, &opts)?);
        }
        CliCommand::Dump { json, .. } => {
            let dump = StringDump::new(&tss, &registry);
            if *json {
                println!("{}", serde_json::to_string_pretty(&dump)?);
            } else {
                for line in dump.to_lines() {
                    println!("{}", line);
                }
            }
        }
        CliCommand::Plain { .. } => println!("{}", tss.text()),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli_args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logger (set RUST_LOG env var to control verbosity)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    run(cli_args)
}
