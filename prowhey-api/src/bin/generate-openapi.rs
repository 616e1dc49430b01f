//! Generates the prowhey-api OpenAPI specification as JSON to stdout.
//!
//! Usage:
//!   cargo run -p prowhey-api --bin generate-openapi --features openapi > openapi.json

use prowhey_api::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let spec = ApiDoc::openapi();

    match serde_json::to_string_pretty(&spec) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("failed to serialize OpenAPI spec: {e}");
            std::process::exit(1);
        }
    }
}
