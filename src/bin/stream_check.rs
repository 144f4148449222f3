//! Binary to log in to the Schwab streamer and subscribe to level-one quotes
//! for AAPL and MSFT plus one-minute equity charts, for inspecting live data.
//!
//! # Usage
//!
//! ```sh
//! export SCHWAB_ACCESS_TOKEN="your-access-token"
//! cargo run --bin stream_check --features cli
//! ```

use std::env;
use std::time::Duration;

use schwab_streamer::client::SchwabClient;
use schwab_streamer::types::Service;
use schwab_streamer::ws::client::StreamerClient;
use tokio::time;

#[tokio::main]
async fn main() -> schwab_streamer::error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let access_token =
        env::var("SCHWAB_ACCESS_TOKEN").expect("set SCHWAB_ACCESS_TOKEN env var before running");

    let rest = SchwabClient::new(access_token)?;
    println!("Fetching streamer parameters…");
    let prefs = rest.get_user_preference().await?;
    println!("{} streamer endpoint(s) offered", prefs.streamer_info.len());

    let streamer = StreamerClient::new(rest);
    streamer.on_data(Service::CHART_EQUITY, |msg| {
        for bar in &msg.content {
            println!(
                "bar {} close={}",
                bar.get("SYMBOL").unwrap_or(&serde_json::Value::Null),
                bar.get("CLOSE_PRICE").unwrap_or(&serde_json::Value::Null)
            );
        }
    });

    println!("Connecting…");
    streamer.connect().await?;
    streamer.login().await?;

    let mut messages = streamer.messages()?;

    println!("Subscribing to LEVELONE_EQUITIES AAPL,MSFT…");
    streamer.level_one_equities_subs(&["AAPL", "MSFT"], None).await?;
    println!("Subscribing to CHART_EQUITY AAPL…");
    streamer.chart_equity_subs(&["AAPL"], None).await?;

    println!("Listening for events for 10 seconds…");
    println!("(Note: quotes only arrive while the market is open)\n");

    let deadline = time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                println!("\n10 seconds elapsed, logging out…");
                break;
            }
            msg = messages.next_message() => {
                match msg {
                    Some(m) if m.service == "LEVELONE_EQUITIES" => println!("{m:#?}"),
                    Some(_) => {}
                    None => {
                        println!("Stream ended by server");
                        break;
                    }
                }
            }
        }
    }

    streamer.logout().await?;
    println!("Done.");

    Ok(())
}
