use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::signal;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Stock, HISTORY_CONCURRENCY_LIMIT};
use crate::poll::{HttpMoversClient, PollController, PollParams, PollState};

const SPARK_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 16;

/// Poll the movers API and print each state snapshot until Ctrl-C.
pub async fn run(api_base: String, params: PollParams, config: Config) -> Result<()> {
    let client = Arc::new(HttpMoversClient::new(api_base));
    let controller = PollController::new(client.clone(), config.poll);
    let handle = controller.spawn(params);
    let mut states = handle.states();

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                render(&client, &state).await;
            }
        }
    }

    handle.shutdown().await
}

async fn render(client: &HttpMoversClient, state: &PollState) {
    if state.loading {
        println!("Loading movers...");
        return;
    }
    if state.errored {
        println!("Fetch failed; retrying in {}s", state.retry_countdown_secs);
        return;
    }
    if state.stocks.is_empty() {
        println!("No movers returned.");
        return;
    }

    let sparklines = sparkline_rows(client, &state.stocks).await;
    println!("{:<14} {:>10} {:>8}  {}", "SYMBOL", "LTP", "CHG%", "TREND");
    for (stock, spark) in state.stocks.iter().zip(sparklines) {
        println!(
            "{:<14} {:>10.2} {:>+8.2}  {}",
            stock.symbol, stock.last_traded_price, stock.percent_change, spark
        );
    }
}

async fn sparkline_rows(client: &HttpMoversClient, stocks: &[Stock]) -> Vec<String> {
    stream::iter(stocks.iter().map(|stock| {
        let symbol = stock.symbol.clone();
        async move {
            let prices = client.fetch_history(&symbol).await;
            sparkline(&prices)
        }
    }))
    .buffered(HISTORY_CONCURRENCY_LIMIT)
    .collect::<Vec<_>>()
    .await
}

/// Render a price series as a fixed-width row of block glyphs.
fn sparkline(prices: &[f64]) -> String {
    if prices.is_empty() {
        return String::new();
    }

    let sampled = downsample(prices, SPARK_WIDTH);
    let min = sampled.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = sampled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    sampled
        .iter()
        .map(|price| {
            if span < f64::EPSILON {
                SPARK_GLYPHS[3]
            } else {
                let scaled = (price - min) / span * (SPARK_GLYPHS.len() - 1) as f64;
                SPARK_GLYPHS[scaled.round() as usize]
            }
        })
        .collect()
}

/// Thin a series to `width` points, keeping both endpoints.
fn downsample(prices: &[f64], width: usize) -> Vec<f64> {
    if prices.len() <= width {
        return prices.to_vec();
    }

    (0..width)
        .map(|i| prices[i * (prices.len() - 1) / (width - 1)])
        .collect()
}
