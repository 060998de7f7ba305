use reqwest::Client;
use std::fs::File;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod models;
mod parser;

use models::{Book, HealthResponse};
use parser::read_books;

const DEFAULT_SERVICE_URL: &str = "http://0.0.0.0:7003";
const DEFAULT_CSV_PATH: &str = "books.data.csv";
const DEFAULT_MAX_RECORDS: usize = 1999;
const READY_ATTEMPTS: u32 = 30;

struct LoaderConfig {
    service_url: String,
    csv_path: String,
    max_records: usize,
}

impl LoaderConfig {
    /// The first CLI argument, when given, overrides `BOOKS_CSV_PATH`.
    fn from_env() -> Self {
        let csv_path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var("BOOKS_CSV_PATH").ok())
            .unwrap_or_else(|| DEFAULT_CSV_PATH.to_string());

        let max_records = match std::env::var("MAX_RECORDS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid MAX_RECORDS '{}'", raw);
                DEFAULT_MAX_RECORDS
            }),
            Err(_) => DEFAULT_MAX_RECORDS,
        };

        Self {
            service_url: std::env::var("BOOKS_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string()),
            csv_path,
            max_records,
        }
    }
}

struct BookLoader {
    client: Client,
    service_url: String,
}

impl BookLoader {
    fn new(service_url: String) -> Self {
        Self {
            client: Client::new(),
            service_url: service_url.trim_end_matches('/').to_string(),
        }
    }

    async fn wait_for_service(&self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Waiting for books service at {}...", self.service_url);

        let url = format!("{}/status", self.service_url);
        for _ in 0..READY_ATTEMPTS {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    let health: HealthResponse = response.json().await?;
                    info!("{} is {}", health.service, health.status);
                    return Ok(());
                }
                Ok(response) => {
                    warn!("Books service responded with status: {}", response.status());
                }
                Err(e) => {
                    warn!("Books service not ready: {}", e);
                }
            }
            sleep(Duration::from_secs(2)).await;
        }

        Err(format!("Books service at {} never became ready", self.service_url).into())
    }

    async fn create_book(&self, book: &Book) -> Result<Book, Box<dyn std::error::Error>> {
        let url = format!("{}/books", self.service_url);
        let response = self.client.post(&url).json(book).send().await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(format!(
                "Failed to create book {:?}: {}",
                book.title,
                response.status()
            )
            .into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("books_loader=info")),
        )
        .init();

    let config = LoaderConfig::from_env();

    info!(
        "Reading up to {} books from {}",
        config.max_records, config.csv_path
    );
    let file = File::open(&config.csv_path)?;
    let parsed = read_books(file, config.max_records)?;
    info!(
        "Parsed {} books, skipped {} rows",
        parsed.books.len(),
        parsed.skipped
    );

    let loader = BookLoader::new(config.service_url);
    loader.wait_for_service().await?;

    let mut loaded = 0;
    let mut failed = 0;
    for book in &parsed.books {
        match loader.create_book(book).await {
            Ok(created) => {
                loaded += 1;
                if let Some(id) = created.id {
                    info!("Created book {} ({:?})", id, created.title);
                }
            }
            Err(e) => {
                failed += 1;
                error!("{}", e);
            }
        }
    }

    info!(
        "Load complete: {} loaded, {} skipped, {} failed",
        loaded, parsed.skipped, failed
    );

    Ok(())
}
