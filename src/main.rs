use std::sync::Arc;

use anyhow::Context;
use lodge_app::{bookings::clock::SystemClock, App};
use lodge_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load lodge settings")?;
    lodge_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "lodge-app bootstrap starting"
    );

    let app = App::bootstrap(settings, Arc::new(SystemClock)).await?;

    tracing::info!("lodge-app bootstrap complete");
    app.serve().await
}
