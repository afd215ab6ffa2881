use tokio::net::TcpListener;
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let options = mock_server::Options {
        allow_origin: std::env::var("ALLOW_ORIGIN").ok(),
    };
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    mock_server::serve(listener, mock_server::app_with(Vec::new(), options)).await?;
    Ok(())
}
