mod cli;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(ambience) = args.first() else {
        eprintln!("usage: alscene-demo <looping-sound> [oneshot-sound]");
        std::process::exit(2);
    };
    let oneshot = args.get(1).unwrap_or(ambience);

    cli::run(ambience, oneshot)
}
