use std::process::ExitCode;
use std::sync::Arc;

use sample_app_server::{
    app::{self, AppState},
    config::{AppConfig, TelemetryConfig},
    error::StartupError,
    server::{self, SHUTDOWN_GRACE_PERIOD},
    telemetry::Telemetry,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = AppConfig::from_env();

    let telemetry = match &config {
        Ok(config) => Telemetry::init(&config.telemetry),
        Err(_) => Telemetry::init(&TelemetryConfig::default()),
    };

    let result = match config {
        Ok(config) => run(config, &telemetry).await,
        Err(e) => Err(StartupError::from(e)),
    };

    telemetry.shutdown();

    match result {
        Ok(()) => {
            info!("Graceful shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig, telemetry: &Telemetry) -> Result<(), StartupError> {
    if config.tls_insecure_skip_verify {
        warn!("APP_TLS_INSECURE_SKIP_VERIFY is set; outbound TLS certificates are not verified");
    }

    let state = Arc::new(AppState::from_config(config)?);
    let config = &state.config;

    info!(
        path = %config.session.options.path,
        secure = config.session.options.secure,
        http_only = config.session.options.http_only,
        same_site = "lax",
        "Session cookie settings"
    );
    info!(
        provider = %state.oidc.provider_name(),
        redirect_url = %config.oidc.redirect_url(),
        login_url = %config.login_url,
        "Registered OIDC provider"
    );

    telemetry.record_startup_spans();

    let listener = server::bind(config.port).await?;
    let metrics_listener = if config.metrics.port == config.port {
        None
    } else {
        Some(server::bind(config.metrics.port).await?)
    };

    let (trigger, shutdown) = server::shutdown_channel();

    let metrics_task = metrics_listener.map(|listener| {
        let router = app::metrics_router(state.metrics.clone(), &config.metrics.path);
        tokio::spawn(server::serve(
            "metrics",
            listener,
            router,
            shutdown.clone(),
            SHUTDOWN_GRACE_PERIOD,
        ))
    });

    let mut main_task = tokio::spawn(server::serve(
        "http",
        listener,
        app::main_router(state.clone()),
        shutdown,
        SHUTDOWN_GRACE_PERIOD,
    ));

    let early = tokio::select! {
        () = server::shutdown_signal() => None,
        result = &mut main_task => Some(result),
    };
    trigger.trigger();

    let main_result = match early {
        Some(result) => result,
        None => main_task.await,
    };
    let main_result = main_result.map_err(|e| StartupError::Serve {
        server: "http",
        reason: e.to_string(),
    })?;

    let metrics_result = match metrics_task {
        Some(task) => task.await.map_err(|e| StartupError::Serve {
            server: "metrics",
            reason: e.to_string(),
        })?,
        None => Ok(()),
    };

    main_result.and(metrics_result)
}
