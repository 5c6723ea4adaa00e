pub mod api;

use crate::cli::Args;
use crate::relay::ChatRelay;
use crate::upload::UploadStore;
use self::api::AppState;
use std::error::Error;

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

impl Server {
    pub async fn new(args: Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let relay = ChatRelay::new(&args)?;
        let uploads = UploadStore::open(&args.upload_dir)
            .await
            .map_err(|e| format!("Failed to prepare upload directory '{}': {}", args.upload_dir, e))?;

        Ok(Self {
            addr: args.server_addr.clone(),
            state: AppState { relay, uploads },
            args,
        })
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.addr, self.state.clone(), self.args.clone()).await
    }
}
