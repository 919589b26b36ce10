use longform::config::{Config, DEFAULT_CONFIG_FILE, SiteConfig};

use crate::InitArgs;

const SAMPLE_PAGE: &str = r#"---
title: Getting Started
description: A first tutorial page.
---
# Getting Started

Tutorials are plain Markdown with a few extras.

[!tip]
> Callouts start with a marker paragraph such as `[!tip]` followed by a quote.

Inline math like \(\beta_1\) and display math work out of the box:

$$
y_{ij} = \beta_0 + \beta_1 t_{ij} + u_{0i} + \varepsilon_{ij}
$$

## Worked Example

```r
library(lme4)
fit <- lmer(y ~ time + (1 | id), data = d)
```

## References & Resources

| Package | Purpose |
|---|---|
| lme4 | Mixed models |
"#;

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {}",
            config_file.display()
        ));
    }

    let default_config = Config {
        site: SiteConfig {
            name: "My Tutorials".into(),
            ..SiteConfig::default()
        },
        ..Config::default()
    };

    println!("Initializing project in {}", path.display());

    let config_text = serde_yaml::to_string(&default_config)?;
    tokio::fs::write(&config_file, config_text).await?;
    println!("Created config file {}", config_file.display());

    let content_dir = path.join(&default_config.site.content);
    let sample = content_dir.join("index.md");
    if !sample.exists() {
        tokio::fs::create_dir_all(&content_dir).await?;
        tokio::fs::write(&sample, SAMPLE_PAGE).await?;
        println!("Created sample page {}", sample.display());
    }

    Ok(())
}
