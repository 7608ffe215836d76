use crate::config::ServiceConfig;
use crate::infrastructure::model::load_gateway;
use crate::interfaces::web::server::create_server;
use tracing::info;

pub struct RunApplicationUseCase {
    config: ServiceConfig,
}

impl RunApplicationUseCase {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    pub async fn execute(self) -> anyhow::Result<()> {
        info!("Loading TripoSR model...");
        // The model handle is loaded once, before the listener binds
        let gateway = load_gateway(&self.config.runtime).await?;
        info!("{} model loaded successfully!", gateway.model_name());

        create_server(self.config, gateway).await
    }
}
