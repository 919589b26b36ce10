use longform::config::Config;

use crate::CleanArgs;

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let config = Config::load_from_arg(args.config_file.as_deref()).await?;

    let site_path = &config.site.output;
    if !site_path.exists() {
        println!("Nothing to clean at {}", site_path.display());
        return Ok(());
    }

    if site_path == &config.site.content {
        return Err(anyhow::anyhow!(
            "Refusing to delete {}: it is also the content directory",
            site_path.display()
        ));
    }

    if args.dry_run {
        println!("Would delete {}", site_path.display());
    } else {
        tokio::fs::remove_dir_all(site_path).await?;
        println!("Deleted {}", site_path.display());
    }

    Ok(())
}
