//! Charts module - Chart rendering

mod renderer;

pub use renderer::{
    chart_file_name, marker_interval, wrap_title, ChartSink, PngRenderer, RenderError,
    MAX_MARKERS, TITLE_WRAP,
};
