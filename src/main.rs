//! # Gateway Server - Entry Point
//! src/main.rs
//!
//! Lee la configuración, carga la aplicación `module:callable` y atiende
//! conexiones hasta que el proceso muere (o hasta el primer fallo con
//! `--fail-fast`).

use gateway_server::app::AppRegistry;
use gateway_server::config::Config;
use gateway_server::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Sin aplicación, clap imprime el uso y sale con código != 0
    let config = Config::new();

    if let Err(e) = config.validate() {
        eprintln!("Provide an application object as module:callable ({})", e);
        std::process::exit(2);
    }

    let registry = AppRegistry::with_defaults();
    let app = match registry.resolve(&config.app) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Available applications: {}", registry.references().join(", "));
            std::process::exit(2);
        }
    };

    config.print_summary();

    let server = match Server::bind(&config, app) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "cannot start server");
            std::process::exit(1);
        }
    };

    println!("GatewayServer: Serving HTTP on port {} ...\n", server.identity().port());

    if let Err(e) = server.serve_forever() {
        eprintln!("Error fatal: {}", e);
        std::process::exit(1);
    }
}
