use std::io::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let role = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PINGPONG_ROLE").ok())
        .unwrap_or_else(|| "host".to_string());

    match role.as_str() {
        "guest" => pingpong::run_guest().await,
        "host" => pingpong::run_host().await,
        other => {
            eprintln!("unknown role {other:?}; expected \"host\" or \"guest\"");
            std::process::exit(2);
        }
    }
}
