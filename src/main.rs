use miette::Result;
use upm_auth::UpmAuth;

#[async_std::main]
async fn main() -> Result<()> {
    UpmAuth::load().await
}
