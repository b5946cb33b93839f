// server/src/main.rs
use actix_web::{rt, App, HttpServer};
use common::{setup_tracing, Config};
use server::auth::hash_password;
use server::middleware::RateLimiter;
use server::ServerState;
use std::io::{self, BufRead};
use std::time::{Duration, Instant};

#[actix_web::main]
async fn main() -> io::Result<()> {
    setup_tracing();

    // `elevatr-server hash-password` reads one password on stdin and prints its PHC string
    if std::env::args().nth(1).as_deref() == Some("hash-password") {
        return print_password_hash();
    }

    let config = Config::from_env();

    // A missing signing secret stops us here, before anything binds
    let state = ServerState::from_config(config).map_err(|e| {
        tracing::error!("Refusing to start: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let server_addr = state.config.server_addr.clone();
    let rate_limiter = RateLimiter::from_config(&state.config.rate_limit);
    let registry = state.registry.clone();

    let sweeper = rate_limiter.clone();
    rt::spawn(async move {
        let mut interval = rt::time::interval(sweeper.window().max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let removed = sweeper.sweep(Instant::now());
            if removed > 0 {
                tracing::debug!("Rate limiter dropped {} idle clients", removed);
            }
        }
    });

    tracing::info!("Starting Elevatr server on {}", server_addr);

    let app_state = state.clone();
    let result = HttpServer::new(move || {
        App::new()
            .wrap(rate_limiter.clone())
            .configure(|cfg| app_state.configure(cfg))
    })
    .bind(&server_addr)?
    .run()
    .await;

    let released = registry.clear();
    tracing::info!("Server stopped, released {} live channels", released);

    result
}

fn print_password_hash() -> io::Result<()> {
    let mut password = String::new();
    io::stdin().lock().read_line(&mut password)?;

    let password = password.trim_end_matches(|c: char| c == '\r' || c == '\n');
    if password.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty password"));
    }

    let hash = hash_password(password)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    println!("{}", hash);
    Ok(())
}
