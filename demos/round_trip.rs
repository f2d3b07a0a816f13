//! Wire round-trip example.
//!
//! Decodes a request message against its compiled schema, walks the typed
//! record, re-encodes it to show normalized key order, and then binds the
//! same command from console-style argument tokens.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p rpckit-demos --example round_trip
//! ```

use rpckit_core::Value;
use serde_json::json;

const SCHEMA: &str = r#"{
    "query": {
        "desc": "Query the ledger by hash or by height.",
        "request": {
            "type": "object",
            "content": {
                "verbose": {
                    "type": "bool",
                    "desc": "include transaction detail",
                    "required": false,
                    "opt": "verbose",
                    "default": false
                },
                "fork": {"type": "bool", "desc": "search the fork instead of the main chain"},
                "hash": {"type": "string", "desc": "block hash", "condition": "fork=true"},
                "height": {"type": "uint", "desc": "block height", "condition": "fork=false"}
            }
        }
    }
}"#;

fn main() {
    let protocol = rpckit_compiler::compile(SCHEMA).unwrap();

    // Field order in the wire message is the sender's choice; conditions
    // decide whether `hash` or `height` is the one required key.
    let wire = json!({"height": 812, "fork": false});
    println!("=== Wire request ===");
    println!("{}", serde_json::to_string_pretty(&wire).unwrap());

    let record = protocol.decode_request("query", &wire).unwrap();
    println!("\n=== Decoded record ===");
    for (key, value) in record.iter() {
        println!("  {key} = {value:?}");
    }
    if let Some(Value::Uint(height)) = record.get("height") {
        println!("  typed access: height is {height}");
    }

    let normalized = protocol.encode_request("query", &record).unwrap();
    println!("\n=== Re-encoded (normalized key order) ===");
    println!("{}", serde_json::to_string_pretty(&normalized).unwrap());

    // The same request built from console tokens: positionals fill fields
    // in normalized order, `-verbose` binds its option by name.
    let args = vec![
        "true".to_string(),
        "0xfeed".to_string(),
        "-verbose".to_string(),
    ];
    let bound = protocol.bind_request("query", &args).unwrap();
    println!("\n=== Bound from `query true 0xfeed -verbose` ===");
    for (key, value) in bound.iter() {
        println!("  {key} = {value:?}");
    }

    let encoded = protocol.encode_request("query", &bound).unwrap();
    println!("\n=== Encoded bound request ===");
    println!("{}", serde_json::to_string_pretty(&encoded).unwrap());
}
