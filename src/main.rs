use anyhow::{Context, bail};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxprep::config::AppConfig;
use voxprep::domain::entities::Subject;
use voxprep::pipeline::{DONE, Pipeline};
use voxprep::web;

const USAGE: &str = "usage: voxprep [serve | train <subject> <video-url> | infer <subject> <file>...]";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = AppConfig::resolve_path();
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(web::serve(config))
        }
        Some("train") => {
            let [_, subject, url] = args.as_slice() else {
                bail!(USAGE);
            };
            let subject = Subject::new(subject)?;
            let report = Pipeline::from_config(&config)?.train(&subject, url)?;
            info!(
                "{} segments, {} vocal clips, config at {}",
                report.segments,
                report.vocals,
                report.config.display()
            );
            println!("{}", DONE);
            Ok(())
        }
        Some("infer") if args.len() >= 3 => {
            let subject = Subject::new(&args[1])?;
            let files: Vec<PathBuf> = args[2..].iter().map(PathBuf::from).collect();
            let report = Pipeline::from_config(&config)?.infer(&subject, &files)?;
            info!("Results archived at {}", report.archive.display());
            println!("{}", DONE);
            Ok(())
        }
        Some(_) => bail!(USAGE),
    }
}
