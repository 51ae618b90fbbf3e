use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    manifest: Option<PathBuf>,
    null_audio: bool,
    convert: Option<(PathBuf, PathBuf)>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    if let Some((input, output)) = args.convert {
        let albums = lumatune::catalog::convert_text_to_json(&input, &output)?;
        println!("wrote {albums} albums to {}", output.display());
        return Ok(());
    }

    let mut settings = lumatune::config::load_settings()?;
    if let Some(manifest) = args.manifest {
        settings.manifest = manifest;
    }
    let _log_guard = lumatune::logging::init(&settings.log_dir)?;

    lumatune::app::run(lumatune::app::AppOptions {
        settings,
        null_audio: args.null_audio,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--manifest" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--manifest requires a path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--manifest cannot be empty");
                }
                out.manifest = Some(PathBuf::from(value.trim()));
            }
            "--null-audio" => out.null_audio = true,
            "--convert" => {
                let (Some(input), Some(output)) = (args.get(index + 1), args.get(index + 2))
                else {
                    anyhow::bail!("--convert requires <input.txt> <output.json>");
                };
                out.convert = Some((PathBuf::from(input), PathBuf::from(output)));
                index += 2;
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
    println!("lumatune");
    println!("  --manifest <path>           Album manifest (.txt or .json)");
    println!("  --null-audio                Run without an audio device");
    println!("  --convert <in.txt> <out>    Rewrite a text manifest as JSON and exit");
}
