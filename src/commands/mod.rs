use async_trait::async_trait;
use miette::Result;

pub mod login;
pub mod verify;

#[async_trait]
pub trait UpmCommand {
    async fn execute(self) -> Result<()>;
}
