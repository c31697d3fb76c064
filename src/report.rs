//! Fixed-width results table: one row per variant, one column per thread count.

use crate::metrics::ResultsMatrix;

/// Width of the variant column, not counting the separator
const TAG_WIDTH: usize = 13;
/// Width of each seconds column
const CELL_WIDTH: usize = 10;
/// The rule under the header is 15 dashes plus 12 per thread column
const RULE_BASE_WIDTH: usize = 15;
const RULE_COLUMN_WIDTH: usize = 12;

fn rule_width(max_threads: usize) -> usize {
    RULE_BASE_WIDTH + RULE_COLUMN_WIDTH * max_threads
}

fn header(max_threads: usize) -> String {
    let mut line = String::from("Variant\\Threads ");
    for t in 1..=max_threads {
        let unit = if t == 1 { "thread" } else { "threads" };
        line.push_str(&format!("| {:>2} {:<7} ", t, unit));
    }
    line.trim_end().to_string()
}

/// Render the matrix of mean seconds with 4 decimal places
pub fn render_table(results: &ResultsMatrix) -> String {
    let header = header(results.max_threads);
    let mut out = String::new();
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(rule_width(results.max_threads)));
    out.push('\n');

    for (tag, cells) in results.rows() {
        out.push_str(&format!("{:<width$} | ", tag, width = TAG_WIDTH));
        for cell in cells {
            out.push_str(&format!("{:>width$.4} | ", cell.mean_secs(), width = CELL_WIDTH));
        }
        out.push('\n');
    }
    out
}

/// Print the results table to stdout
pub fn print_results(results: &ResultsMatrix) {
    print!("{}", render_table(results));
}
