use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty.
///
/// `--envs` prints the current configuration environment. Any other argument prints the help text as well.
/// Returns true if arguments were supplied, in which case the caller should exit.
pub fn handle_command_line_args() -> bool {
    let args = env::args().skip(1).collect::<Vec<String>>();
    if args.is_empty() {
        return false;
    }
    if args.iter().all(|a| a != "--envs") {
        display_readme();
    }
    display_envs();
    true
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "MKT_HOST",
        "MKT_PORT",
        "MKT_DATABASE_URL",
        "MKT_FRONTEND_URL",
        "MKT_PAYSTACK_BASE_URL",
        "MKT_PAYSTACK_TIMEOUT_SECS",
        "MKT_PAYSTACK_TEST_MODE",
        "MKT_PAYSTACK_WHITELIST",
        "MKT_PAYSTACK_IP_WHITELIST_DISABLED",
        "MKT_USE_X_FORWARDED_FOR",
        "MKT_USE_FORWARDED",
        "MKT_DISABLE_WEBHOOK_HMAC",
        "MKT_UNPAID_ORDER_TIMEOUT",
        "MKT_UNPAID_ORDER_CHECK_INTERVAL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
