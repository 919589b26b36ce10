use longform::{
    build::Builder,
    config::{Config, OnError},
};

use crate::BuildArgs;

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let mut config = Config::load_from_arg(args.config_file.as_deref()).await?;

    if let Some(output) = &args.output {
        config.site.output = if output.is_relative() {
            std::env::current_dir()?.join(output)
        } else {
            output.clone()
        };
    }
    if args.strict {
        config.build.on_error = OnError::Fail;
    }

    let builder = Builder::new(config);
    let result = builder.build().await?;

    println!(
        "Built site to {} ({} pages, {} static files)",
        result.output_dir.display(),
        result.pages,
        result.static_files
    );

    if !result.failures.is_empty() {
        println!("{} document(s) failed:", result.failures.len());
        for (slug, failure) in &result.failures {
            println!("  {slug}: {} ({})", failure.reason, failure.stage);
        }
    }

    Ok(())
}
