//! Synchronous request dispatch.
//!
//! Every entry point returns a [`Response`]; failures are reported as
//! `{ok: false, error}` instead of propagating.

use crate::types::{Request, Response, ResponseData, API_VERSION};
use panelcut_cabinet::{Optimizer, ResultCache};
use panelcut_core::{Part, Result, Solver};
use panelcut_sheet::SheetNester;
use std::sync::Arc;

/// Executes `request` without a result cache.
pub fn handle_request(request: Request) -> Response {
    handle_request_with_cache(request, None)
}

/// Executes `request`, memoizing optimize jobs in `cache` when given.
pub fn handle_request_with_cache(
    request: Request,
    cache: Option<Arc<dyn ResultCache>>,
) -> Response {
    let op = request.op();
    match dispatch(request, cache) {
        Ok(data) => Response::success(data),
        Err(err) => {
            if err.is_geometry_violation() {
                log::error!("{} job aborted: {}", op, err);
            } else {
                log::warn!("{} job failed: {}", op, err);
            }
            Response::failure(err.to_string())
        }
    }
}

fn dispatch(request: Request, cache: Option<Arc<dyn ResultCache>>) -> Result<ResponseData> {
    match request {
        Request::Optimize { config, request } => {
            let mut optimizer = Optimizer::new(config);
            if let Some(cache) = cache {
                optimizer = optimizer.with_cache(cache);
            }
            optimizer.optimize(&request).map(ResponseData::Groups)
        }
        Request::Pack {
            parts,
            sheet,
            config,
        } => {
            let parts: Vec<Part> = parts.into_iter().map(Part::from).collect();
            SheetNester::new(config)
                .solve(&parts, &sheet)
                .map(ResponseData::Run)
        }
        Request::Insert {
            config,
            results,
            target_sheet_id,
            panels,
        } => Optimizer::new(config)
            .insert_manual(&results, &target_sheet_id, &panels)
            .map(ResponseData::Groups),
    }
}

/// Parses a JSON request, executes it and returns the JSON response.
pub fn handle_json(json_str: &str) -> String {
    handle_json_with_cache(json_str, None)
}

/// [`handle_json`] with an optional result cache.
pub fn handle_json_with_cache(json_str: &str, cache: Option<Arc<dyn ResultCache>>) -> String {
    let response = match serde_json::from_str::<Request>(json_str) {
        Ok(request) => handle_request_with_cache(request, cache),
        Err(e) => Response::failure(format!("Invalid JSON: {}", e)),
    };
    encode(&response)
}

/// Serializes a response, falling back to a bare error message.
pub fn encode(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        serde_json::json!({
            "version": API_VERSION,
            "ok": false,
            "error": format!("Failed to encode response: {}", e),
        })
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn call(request: Value) -> Value {
        serde_json::from_str(&handle_json(&request.to_string())).unwrap()
    }

    #[test]
    fn test_version() {
        let response = call(json!({ "op": "pack", "parts": [] }));
        assert_eq!(response["version"], API_VERSION);
    }

    #[test]
    fn test_pack_json() {
        let response = call(json!({
            "op": "pack",
            "parts": [{ "id": "A", "width": 400, "height": 600, "quantity": 2 }],
            "sheet": { "width": 1210, "height": 2420, "kerf": 4 },
            "config": { "strategy": "BSSF", "seed": 11, "maxIterations": 10 }
        }));
        assert_eq!(response["ok"], json!(true));
        assert_eq!(response["data"]["totals"]["sheetCount"], json!(1));
        assert_eq!(response["data"]["strategy"], json!("BSSF"));
        assert_eq!(response["data"]["seed"], json!(11));
    }

    #[test]
    fn test_optimize_json() {
        let response = call(json!({
            "op": "optimize",
            "config": { "solver": { "seed": 3, "maxIterations": 10 } },
            "request": { "panels": [
                { "name": "Top", "width": 900, "height": 560, "brand": "Oak", "laminate": "W1" },
                { "name": "Shutter 1", "width": 450, "height": 700, "brand": "Oak", "laminate": "Gloss" }
            ] }
        }));
        assert_eq!(response["ok"], json!(true));
        let groups = response["data"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["key"], json!("oak|||w1"));
    }

    #[test]
    fn test_optimize_json_grain_keys_as_written() {
        let response = call(json!({
            "op": "optimize",
            "config": {
                "solver": { "seed": 3, "maxIterations": 10 },
                "grainPreferences": { "W101 + PVC": true }
            },
            "request": { "panels": [
                { "name": "Left", "width": 560, "height": 720, "laminate": "W101" },
                { "name": "Top", "width": 900, "height": 560, "quantity": 1e30, "laminate": "W101" }
            ] }
        }));
        assert_eq!(response["ok"], json!(true));
        let placements = response["data"][0]["result"]["sheets"][0]["placements"]
            .as_array()
            .unwrap();
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0]["part"]["rotateAllowed"], json!(false));
    }

    #[test]
    fn test_invalid_json() {
        let response = call(json!("not a request"));
        assert_eq!(response["ok"], json!(false));
        assert!(response["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON"));

        let raw: Value = serde_json::from_str(&handle_json("{ nope")).unwrap();
        assert_eq!(raw["ok"], json!(false));
    }

    #[test]
    fn test_errors_become_failures() {
        let response = handle_request(Request::Pack {
            parts: vec![],
            sheet: panelcut_core::Sheet::new(0.0, 100.0, 0.0),
            config: Default::default(),
        });
        assert!(!response.ok);
        assert!(response.error.unwrap().contains("invalid sheet"));

        let response = call(json!({
            "op": "insert",
            "results": [],
            "targetSheetId": "missing::0",
            "panels": []
        }));
        assert_eq!(response["ok"], json!(false));
        assert_eq!(response["error"], json!("sheet not found: missing::0"));
    }
}
