//! Print the OpenAPI document as JSON.

use backend::doc::ApiDoc;
use utoipa::OpenApi;

fn main() {
    match ApiDoc::openapi().to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialise OpenAPI document: {err}");
            std::process::exit(1);
        }
    }
}
