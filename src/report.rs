use std::time::Duration;

use crate::peer::ProbeResult;
use crate::rank::RankedResults;

/// Print the ranked results as terminal tables.
pub fn print_results(results: &RankedResults, show_dead: bool) {
    println!();
    println!("=================================");
    println!(" ALIVE PEERS (sorted by latency):");
    println!("=================================");
    let rows: Vec<[String; 3]> = results
        .alive
        .iter()
        .map(|r| [r.peer.uri(), format_latency(r.latency), r.peer.location()])
        .collect();
    let uri_width = column_width(&rows, "URI".len());
    println!("{:<uri_width$} {:<12} {}", "URI", "Latency (ms)", "Location");
    println!("{:<uri_width$} {:<12} {}", "---", "------------", "--------");
    for [uri, latency, location] in &rows {
        println!("{:<uri_width$} {:<12} {}", uri, latency, location);
    }

    if show_dead {
        println!();
        println!("============");
        println!(" DEAD PEERS:");
        println!("============");
        let rows: Vec<[String; 3]> = results
            .dead
            .iter()
            .map(|r| [r.peer.uri(), String::new(), r.peer.location()])
            .collect();
        let uri_width = column_width(&rows, "URI".len());
        println!("{:<uri_width$} {}", "URI", "Location");
        println!("{:<uri_width$} {}", "---", "--------");
        for [uri, _, location] in &rows {
            println!("{:<uri_width$} {}", uri, location);
        }
    }
}

fn column_width(rows: &[[String; 3]], floor: usize) -> usize {
    rows.iter().map(|row| row[0].len()).max().unwrap_or(0).max(floor)
}

fn format_latency(latency: Option<Duration>) -> String {
    match latency {
        Some(d) => format!("{:.3}", d.as_secs_f64() * 1000.0),
        None => "-".into(),
    }
}
