//! Statistics reporting.

use console::style;

use crate::download::DownloadReport;
use crate::model::ProfileGraph;

/// Print a summary of what was scraped.
pub fn print_scrape_summary(graph: &ProfileGraph) {
    let board_pins: usize = graph.boards.iter().map(|b| b.pins.len()).sum();

    println!();
    println!(
        "{}",
        style(format!("Scraped {}:", graph.user.username)).bold()
    );
    println!("  Created pins: {}", graph.created.len());
    println!("  Boards:       {}", graph.boards.len());
    println!("  Board pins:   {}", board_pins);
}

/// Print the end-of-run download summary.
pub fn print_report(report: &DownloadReport) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Download summary:").bold());
    println!("  Boards processed: {}", report.boards_processed);
    if report.boards_failed > 0 {
        println!(
            "  Boards failed:    {}",
            style(report.boards_failed).red()
        );
    }
    println!("  Images: {}", report.images);
    println!("  Videos: {}", report.videos);
    println!(
        "  Total:  {:.2} MB",
        report.total_bytes as f64 / (1024.0 * 1024.0)
    );
    println!("{}", style("═".repeat(50)).dim());
}
