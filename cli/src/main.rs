use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use posts_core::{
    ApiError, ClientConfig, Container, Dispatcher, Post, PostRenderer, PostsClient, UreqTransport,
};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(name = "posts", version, about = "Fetch and submit posts, printing them as HTML cards")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the posts API (overrides config and POSTS_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request deadline in milliseconds, 0 to wait forever
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Origin of the requesting page; enables cross-origin checks
    #[arg(long, global = true)]
    origin: Option<String>,

    /// Extra request header as `name:value`; may be repeated
    #[arg(short = 'H', long = "header", global = true, value_parser = parse_header)]
    headers: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all posts and display them
    List,
    /// Submit a new post and display it first
    Create {
        #[arg(long, default_value = "foo")]
        title: String,
        #[arg(long, default_value = "bar")]
        body: String,
        #[arg(long, default_value_t = 1)]
        user_id: u64,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `name:value`, got {raw:?}"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let mut config = config.with_env()?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout_ms = Some(ms);
    }
    if let Some(origin) = &cli.origin {
        config.origin = Some(origin.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(?config, "configuration loaded");

    let client = PostsClient::from_config(&config).with_headers(cli.headers.iter().cloned());
    let dispatcher = Dispatcher::from_config(UreqTransport::new(config.timeout()), &config);
    let renderer = PostRenderer::new(Container::default());
    let failed = Arc::new(AtomicBool::new(false));

    let target = renderer.clone();
    let flag = Arc::clone(&failed);
    let completion = match cli.command {
        Commands::List => dispatcher.request(
            client.build_list_posts(),
            move |result: Result<Vec<Post>, ApiError>| match result {
                Ok(posts) => {
                    tracing::info!(count = posts.len(), "posts fetched");
                    target.render_list(&posts);
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to fetch posts");
                    flag.store(true, Ordering::SeqCst);
                }
            },
        ),
        Commands::Create {
            title,
            body,
            user_id,
        } => {
            let request = client.build_create_post(&Post::new(title, body, user_id))?;
            dispatcher.request(request, move |result: Result<Post, ApiError>| match result {
                Ok(post) => {
                    tracing::info!(id = ?post.id, "post created");
                    target.render_one(&post);
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to create post");
                    flag.store(true, Ordering::SeqCst);
                }
            })
        }
    };
    completion.await?;

    println!("{}", renderer.container().to_html());
    if failed.load(Ordering::SeqCst) {
        bail!("request failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_flag_splits_on_first_colon() {
        assert_eq!(
            parse_header("x-auth: a:b").unwrap(),
            ("x-auth".to_string(), "a:b".to_string())
        );
        assert!(parse_header("no-colon").is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "posts",
            "--base-url",
            "http://localhost:3000",
            "--timeout-ms",
            "0",
            "-H",
            "x-auth:token",
            "create",
            "--title",
            "hello",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout(), None);
        assert_eq!(cli.headers, [("x-auth".to_string(), "token".to_string())]);
        assert!(matches!(cli.command, Commands::Create { ref title, user_id: 1, .. } if title == "hello"));
    }
}
