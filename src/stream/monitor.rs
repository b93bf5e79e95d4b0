//! Foreground driver for a live stream
//!
//! The acquisition thread fills the buffer; this side wakes on two timers,
//! one to redraw the chart and one to print the summary, until Ctrl+C.

use super::acquire::DataStream;
use super::buffer::Summary;
use super::render::render_chart;
use crate::config::Config;
use crate::serial::SerialConnection;
use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tokio::time::MissedTickBehavior;

/// Options for a stream session
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Chart file re-rendered on every refresh tick
    pub plot: Option<PathBuf>,
    pub quiet: bool,
}

/// Run a stream session on `conn` until Ctrl+C
pub fn run_stream<P>(conn: SerialConnection<P>, config: &Config, options: &StreamOptions) -> Result<()>
where
    P: Read + Write + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start stream runtime")?;

    let port_name = conn.name().to_string();
    let mut stream = DataStream::new(conn, config.buffer_capacity);

    println!("{}", "\n--- Stream Started ---".cyan().bold());
    println!("{}", "Press Ctrl+C to stop\n".yellow());

    stream.start();
    let result = runtime.block_on(drive(&stream, config, options, &port_name));
    stream.stop();

    if let Some(ref path) = options.plot {
        redraw(&stream, config, path, &port_name);
    }
    print_final(&stream, options);

    result
}

async fn drive<P>(
    stream: &DataStream<P>,
    config: &Config,
    options: &StreamOptions,
    port_name: &str,
) -> Result<()>
where
    P: Read + Write + Send + 'static,
{
    let mut redraw_timer = tokio::time::interval(config.refresh_interval());
    redraw_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut summary_timer = tokio::time::interval(config.summary_interval());
    summary_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl+C")?;
                println!("\n{}", "Stopping stream...".yellow());
                break;
            }
            _ = redraw_timer.tick(), if options.plot.is_some() => {
                if let Some(ref path) = options.plot {
                    redraw(stream, config, path, port_name);
                }
            }
            _ = summary_timer.tick(), if !options.quiet => {
                print_summary(&stream.summary());
            }
        }
    }

    Ok(())
}

fn redraw<P>(stream: &DataStream<P>, config: &Config, path: &Path, port_name: &str)
where
    P: Read + Write + Send + 'static,
{
    // Copy out so the acquisition thread is not blocked while drawing
    let snapshot = stream.buffer().clone();
    let caption = format!("{} @ {}", port_name, Local::now().format("%H:%M:%S"));

    if let Err(e) = render_chart(&snapshot, &config.plot, path, &caption) {
        log::warn!("{:#}", e);
    }
}

/// Format a summary the way it is shown while streaming
pub fn format_summary(summary: &Summary) -> String {
    format!(
        "Mean {:>10.3}  Max {:>10.3}  Min {:>10.3}  (ndata = {})",
        summary.mean, summary.max, summary.min, summary.count
    )
}

fn print_summary(summary: &Summary) {
    println!(
        "{} {}",
        Local::now().format("%H:%M:%S%.3f").to_string().dimmed(),
        format_summary(summary)
    );
}

fn print_final<P>(stream: &DataStream<P>, options: &StreamOptions)
where
    P: Read + Write + Send + 'static,
{
    println!("\n{}", "=".repeat(70).dimmed());
    println!("{}", "--- Stream Summary ---".cyan().bold());
    println!("Samples accepted: {}", stream.stats().accepted());
    let dropped = stream.stats().dropped();
    println!(
        "Lines dropped: {}",
        if dropped > 0 {
            dropped.to_string().yellow().to_string()
        } else {
            dropped.to_string().green().to_string()
        }
    );
    println!("Buffered: {}", stream.status());
    println!("Mean: {:.3}", stream.mean());
    println!("Max: {:.3}", stream.max());
    println!("Min: {:.3}", stream.min());
    if let Some(ref path) = options.plot {
        println!("Chart saved to: {}", path.display().to_string().white());
    }
    println!("{}", "=".repeat(70).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_summary_empty() {
        let summary = Summary {
            mean: -1.0,
            max: -1.0,
            min: -1.0,
            count: 0,
        };
        assert_eq!(
            format_summary(&summary),
            "Mean     -1.000  Max     -1.000  Min     -1.000  (ndata = 0)"
        );
    }

    #[test]
    fn test_format_summary_values() {
        let summary = Summary {
            mean: 512.25,
            max: 600.0,
            min: 400.5,
            count: 2000,
        };
        let line = format_summary(&summary);
        assert!(line.contains("Mean    512.250"));
        assert!(line.contains("Min    400.500"));
        assert!(line.ends_with("(ndata = 2000)"));
    }
}
