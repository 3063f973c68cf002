#[derive(Debug, Default)]
struct CliArgs {
    dir: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let sounds_dir = hallowtune::config::sounds_dir(args.dir.as_deref());
    hallowtune::app::run(&sounds_dir)
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--dir" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--dir requires a path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--dir cannot be empty");
                }
                out.dir = Some(value.trim().to_string());
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
    println!("Hallownest Radio");
    println!("  --dir <path>    Soundtrack directory (default ./sounds)");
}
