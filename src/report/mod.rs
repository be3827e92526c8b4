pub mod chart;
pub mod summary;

pub use chart::{render_bar_chart, render_text_chart, ChartOptions};
pub use summary::{render_console_summary, render_csv, render_json};
