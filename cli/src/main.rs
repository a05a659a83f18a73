mod commands;

use std::env;

use zkpocket_config::PocketConfig;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let cmd = &args[1];

    if matches!(cmd.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    if cmd == "config-sample" {
        if let Err(e) = commands::config_sample(args.get(2).map(String::as_str)) {
            eprintln!("❌ Error writing sample config: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match PocketConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error loading config: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cmd.as_str() {
        "keygen" => commands::keygen(&config),
        "recover" => match args.get(2) {
            Some(sk) => commands::recover(&config, sk),
            None => {
                println!("Usage: recover <secret-key-hex>");
                return;
            }
        },
        "audit-keygen" => commands::audit_keygen(&config),
        "decrypt-audit" => {
            if args.len() < 4 {
                println!("Usage: decrypt-audit <auditor-sk> <ct-word>...");
                println!("  ct-word - c0.x c0.y c1.x c1.y c2.x c2.y c3... as logged by the pool");
                return;
            }
            commands::decrypt_audit(&config, &args[2], &args[3..])
        }
        "balance" => commands::balance(&config, args.get(2).map(String::as_str)).await,
        "sync" => commands::sync(&config).await,
        "register" => commands::register(&config).await,
        _ => {
            println!("❌ Unknown command: {}", cmd);
            println!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error running {}: {:#}", cmd, e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("zkpocket CLI - Shielded Pocket Wallet");
    println!();
    println!("USAGE:");
    println!("  zkpocket <command> [args]");
    println!();
    println!("KEY COMMANDS:");
    println!("  keygen                     Generate a user key into the secret file");
    println!("  recover <sk>               Rebuild the user key from its secret scalar");
    println!("  audit-keygen               Generate an auditor keypair");
    println!("  decrypt-audit <sk> <ct..>  Open a logged note ciphertext as the auditor");
    println!();
    println!("WALLET COMMANDS:");
    println!("  register                   Publish the user public key to the pool");
    println!("  sync                       Scan pool events for notes");
    println!("  balance [token]            Decrypt the private balance (default: native)");
    println!();
    println!("OTHER COMMANDS:");
    println!("  config-sample [path]       Print or write a sample config.toml");
    println!("  help                       Show this help message");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("  ZKP_CONFIG           Config file path");
    println!("  ZKP_PASSPHRASE       Passphrase protecting the secret file");
    println!("  ZKP_RPC_URL          Ledger JSON-RPC endpoint");
    println!("  ZKP_PROVER_URL       Prover service endpoint");
    println!("  RUST_LOG             Log level (debug/info/warn/error)");
}
