use std::{fs, path::PathBuf};

use customer_api::openapi::ApiDocV1;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let openapi = ApiDocV1::openapi();
    let json = serde_json::to_string_pretty(&openapi)?;

    let output_dir = PathBuf::from("openapi");
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("customer-api.json");
    fs::write(&output_path, json)?;

    println!("OpenAPI document written to {}", output_path.display());
    Ok(())
}
