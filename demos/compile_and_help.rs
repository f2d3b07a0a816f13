//! Schema compilation and help rendering example.
//!
//! Compiles an embedded wallet-style schema together with an invocation
//! mode document, lists the commands it declares, and prints the rendered
//! terminal help for one command, one mode, and the console command list.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p rpckit-demos --example compile_and_help
//! ```

const SCHEMA: &str = r#"{
    "txinfo": {
        "type": "class",
        "content": {
            "txid": {"type": "string", "desc": "transaction id"},
            "confirmations": {"type": "int", "desc": "depth in the chain"}
        }
    },
    "send": {
        "desc": "Send coins to an address.",
        "request": {
            "type": "object",
            "content": {
                "to": {"type": "string", "desc": "destination address"},
                "amount": {
                    "type": "double",
                    "desc": "amount to send",
                    "required": false,
                    "opt": "amount",
                    "default": 0.1
                }
            }
        },
        "response": {"type": "txinfo"},
        "example": [{"request": "send 1xyz -amount=2.5"}]
    },
    "getblockcount": {
        "desc": "Get the height of the longest chain.",
        "request": {"type": "object", "content": {}},
        "response": {"type": "int", "name": "count"}
    }
}"#;

const MODES: &str = r#"{
    "server": {
        "usage": "walletd [options]",
        "desc": "Run the wallet RPC server in the foreground."
    },
    "console": {
        "usage": "walletd console [command] [params]",
        "desc": "Attach an interactive console to a running server."
    }
}"#;

fn main() {
    let protocol = rpckit_compiler::compile_with_modes(SCHEMA, MODES).unwrap();

    println!("=== Commands ===");
    for name in protocol.command_names() {
        let command = protocol.command(name).unwrap();
        println!("  {name}: {}", command.introduction);
    }
    println!();

    println!("=== Help for `send` ===");
    print!("{}", protocol.help("send").unwrap());
    println!();

    println!("=== Mode `server` ===");
    let options = "        -conf=<file>    read settings from <file>\n";
    print!("{}", protocol.mode_help("server", None, options).unwrap());
    println!();

    println!("=== Console command list ===");
    print!("{}", protocol.mode_help("console", None, "").unwrap());
    println!();

    println!("=== Console page for `getblockcount` ===");
    print!(
        "{}",
        protocol.mode_help("console", Some("getblockcount"), "").unwrap()
    );
}
