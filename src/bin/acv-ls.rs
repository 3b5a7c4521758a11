use angular_component_viewer::lsp::server::serve;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    serve().await
}
