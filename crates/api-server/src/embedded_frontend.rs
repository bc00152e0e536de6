use rust_embed::Embed;

/// Static page served at `/`
#[derive(Embed)]
#[folder = "../../frontend/"]
#[exclude = "*.md"]
#[exclude = ".*"]
pub struct FrontendAssets;
